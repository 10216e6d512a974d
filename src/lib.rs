//! # Thai Accounting Core
//!
//! Statement ingestion and general-ledger posting for an accounting firm
//! serving Thai clients.
//!
//! ## Features
//!
//! - **Statement parsing**: CSV and spreadsheet exports from Thai banks, Buddhist-era
//!   dates and Thai-formatted amounts normalized into canonical bank transactions
//! - **Bank format registry**: built-in layouts for the major Thai banks with alias-based
//!   detection and a generic fallback, extendable from configuration
//! - **Posting validation**: double-entry balance within a tolerance, period locks,
//!   account code shape and line completeness, all reported in one pass
//! - **Duplicate screening**: exact and fuzzy duplicate document detection
//! - **Batch posting**: per-item success or rejection, serialized per client and period
//! - **Storage abstraction**: append-only repository trait with an in-memory implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use thai_accounting_core::{EntryGroupBuilder, Ledger, MemoryStorage};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ledger = Ledger::new(MemoryStorage::new());
//! let group = EntryGroupBuilder::new(
//!     "client-1",
//!     NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
//!     "RV-0001",
//!     "Cash sale",
//! )
//! .debit("1000", "Cash", BigDecimal::from(107))
//! .credit("4000", "Sales", BigDecimal::from(100))
//! .credit("2170", "Output VAT", BigDecimal::from(7))
//! .build()
//! .unwrap();
//!
//! let result = ledger.post_batch(vec![group]).await;
//! assert_eq!(result.posted_count, 1);
//! # }
//! ```

pub mod config;
pub mod ledger;
pub mod statement;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use statement::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;

// Re-export entry patterns for convenience
pub use ledger::transaction::patterns;
