//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for posted entry groups, period state and bank transactions
///
/// This trait lets the posting core work with any key-value or document store
/// by implementing these methods. Entry groups are append-only: the group is
/// the unit of atomicity, so `append_group` must persist every line of the
/// group or none of them.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Persist a whole entry group as one atomic unit
    async fn append_group(&self, group: &LedgerEntryGroup) -> LedgerResult<()>;

    /// Every group posted for a client inside one accounting period
    async fn read_all(
        &self,
        client_id: &str,
        period: PeriodMonth,
    ) -> LedgerResult<Vec<LedgerEntryGroup>>;

    /// Every group posted for a client, across periods
    async fn read_client(&self, client_id: &str) -> LedgerResult<Vec<LedgerEntryGroup>>;

    /// Period state; `None` means the period was never touched and is open
    async fn get_period(&self, client_id: &str, month: PeriodMonth)
        -> LedgerResult<Option<Period>>;

    /// Insert or replace a period record
    async fn save_period(&self, period: &Period) -> LedgerResult<()>;

    /// Append parsed bank transactions for a client
    async fn append_bank_transactions(&self, transactions: &[BankTransaction])
        -> LedgerResult<()>;

    /// Bank transactions stored for a client, in insertion order
    async fn list_bank_transactions(&self, client_id: &str) -> LedgerResult<Vec<BankTransaction>>;
}

/// Trait for implementing entry group validation rules
///
/// Validation is a pure function of the group and the current period state:
/// implementations must not write anything, and must run every check so the
/// caller receives the full list of findings in one pass.
pub trait EntryValidator: Send + Sync {
    fn validate(&self, group: &LedgerEntryGroup, period: Option<&Period>) -> ValidationResult;
}
