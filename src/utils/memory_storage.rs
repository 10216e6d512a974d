//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    groups: Arc<RwLock<HashMap<String, Vec<LedgerEntryGroup>>>>,
    periods: Arc<RwLock<HashMap<PeriodKey, Period>>>,
    bank_transactions: Arc<RwLock<HashMap<String, Vec<BankTransaction>>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> LedgerError {
    LedgerError::Storage("memory storage lock poisoned".to_string())
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        self.groups.write().map_err(poisoned)?.clear();
        self.periods.write().map_err(poisoned)?.clear();
        self.bank_transactions.write().map_err(poisoned)?.clear();
        Ok(())
    }

    /// Number of groups stored across all clients
    pub fn group_count(&self) -> LedgerResult<usize> {
        Ok(self
            .groups
            .read()
            .map_err(poisoned)?
            .values()
            .map(Vec::len)
            .sum())
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn append_group(&self, group: &LedgerEntryGroup) -> LedgerResult<()> {
        let mut groups = self.groups.write().map_err(poisoned)?;
        let client_groups = groups.entry(group.client_id.clone()).or_default();
        if client_groups.iter().any(|g| g.id == group.id) {
            return Err(LedgerError::Storage(format!(
                "Entry group {} has already been appended",
                group.id
            )));
        }
        client_groups.push(group.clone());
        Ok(())
    }

    async fn read_all(
        &self,
        client_id: &str,
        period: PeriodMonth,
    ) -> LedgerResult<Vec<LedgerEntryGroup>> {
        let groups = self.groups.read().map_err(poisoned)?;
        Ok(groups
            .get(client_id)
            .map(|client_groups| {
                client_groups
                    .iter()
                    .filter(|g| g.period_month == period)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read_client(&self, client_id: &str) -> LedgerResult<Vec<LedgerEntryGroup>> {
        let groups = self.groups.read().map_err(poisoned)?;
        Ok(groups.get(client_id).cloned().unwrap_or_default())
    }

    async fn get_period(
        &self,
        client_id: &str,
        month: PeriodMonth,
    ) -> LedgerResult<Option<Period>> {
        let periods = self.periods.read().map_err(poisoned)?;
        Ok(periods.get(&PeriodKey::new(client_id, month)).cloned())
    }

    async fn save_period(&self, period: &Period) -> LedgerResult<()> {
        self.periods
            .write()
            .map_err(poisoned)?
            .insert(period.key(), period.clone());
        Ok(())
    }

    async fn append_bank_transactions(
        &self,
        transactions: &[BankTransaction],
    ) -> LedgerResult<()> {
        let mut stored = self.bank_transactions.write().map_err(poisoned)?;
        for txn in transactions {
            stored
                .entry(txn.client_id.clone())
                .or_default()
                .push(txn.clone());
        }
        Ok(())
    }

    async fn list_bank_transactions(&self, client_id: &str) -> LedgerResult<Vec<BankTransaction>> {
        let stored = self.bank_transactions.read().map_err(poisoned)?;
        Ok(stored.get(client_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn group(client: &str, y: i32, m: u32) -> LedgerEntryGroup {
        let mut group = LedgerEntryGroup::new(
            client,
            NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
            "JV-1",
            "Journal",
        );
        group.add_line(LedgerLine::debit("1000", "Cash", BigDecimal::from(1)));
        group.add_line(LedgerLine::credit("4000", "Sales", BigDecimal::from(1)));
        group
    }

    #[tokio::test]
    async fn test_groups_by_client_and_period() {
        let storage = MemoryStorage::new();
        storage.append_group(&group("c1", 2024, 1)).await.unwrap();
        storage.append_group(&group("c1", 2024, 2)).await.unwrap();
        storage.append_group(&group("c2", 2024, 1)).await.unwrap();

        let jan = PeriodMonth::new(2024, 1).unwrap();
        assert_eq!(storage.read_all("c1", jan).await.unwrap().len(), 1);
        assert_eq!(storage.read_client("c1").await.unwrap().len(), 2);
        assert!(storage.read_client("c3").await.unwrap().is_empty());
        assert_eq!(storage.group_count().unwrap(), 3);

        storage.clear().unwrap();
        assert_eq!(storage.group_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_is_once_per_group() {
        let storage = MemoryStorage::new();
        let g = group("c1", 2024, 1);
        storage.append_group(&g).await.unwrap();
        let err = storage.append_group(&g).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[tokio::test]
    async fn test_period_round_trip() {
        let storage = MemoryStorage::new();
        let month = PeriodMonth::new(2024, 5).unwrap();
        assert!(storage.get_period("c1", month).await.unwrap().is_none());

        let mut period = Period::open("c1", month);
        period.locked = true;
        storage.save_period(&period).await.unwrap();

        let loaded = storage.get_period("c1", month).await.unwrap().unwrap();
        assert!(loaded.locked);
        assert!(storage.get_period("c2", month).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        handle.append_group(&group("c1", 2024, 1)).await.unwrap();
        assert_eq!(storage.group_count().unwrap(), 1);
    }
}
