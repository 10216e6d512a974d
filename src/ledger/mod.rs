//! Ledger module containing validation, duplicate screening and posting

pub mod core;
pub mod duplicate;
pub mod locks;
pub mod rules;
pub mod transaction;
pub mod validator;

pub use self::core::*;
pub use duplicate::*;
pub use locks::*;
pub use rules::*;
pub use transaction::*;
pub use validator::*;
