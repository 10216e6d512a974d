//! Per-period mutual exclusion
//!
//! Validation and commit of a group, and locking of a period, must not
//! interleave for the same `(client, month)`. Each key gets its own async
//! mutex so unrelated clients and months never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::PeriodKey;

/// Registry of one async mutex per period key
#[derive(Debug, Default)]
pub struct PeriodLocks {
    locks: Mutex<HashMap<PeriodKey, Arc<AsyncMutex<()>>>>,
}

impl PeriodLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a period; released when the guard drops
    ///
    /// Mutexes that nobody holds or waits on are dropped on the way in, so
    /// the map stays bounded by the number of keys currently in use.
    pub async fn acquire(&self, key: &PeriodKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Guards and waiters each hold a clone of the Arc
            locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys tracked; idle keys linger until the next `acquire`
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key(client: &str, month: &str) -> PeriodKey {
        PeriodKey::new(client, month.parse().unwrap())
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = PeriodLocks::new();
        let guard = locks.acquire(&key("c1", "2024-01")).await;

        let second = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(&key("c1", "2024-01")),
        )
        .await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(&key("c1", "2024-01")),
        )
        .await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = PeriodLocks::new();
        let _a = locks.acquire(&key("c1", "2024-01")).await;
        let _b = locks.acquire(&key("c1", "2024-02")).await;
        let _c = locks.acquire(&key("c2", "2024-01")).await;
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_idle_keys_are_pruned() {
        let locks = PeriodLocks::new();
        for month in 1..=12 {
            let guard = locks.acquire(&key("c1", &format!("2024-{month:02}"))).await;
            drop(guard);
        }
        assert_eq!(locks.len(), 1);

        let held = locks.acquire(&key("c2", "2024-01")).await;
        let _other = locks.acquire(&key("c3", "2024-01")).await;
        assert_eq!(locks.len(), 2);

        drop(held);
        let _again = locks.acquire(&key("c2", "2024-01")).await;
        assert_eq!(locks.len(), 2);
    }
}
