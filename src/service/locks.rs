//! Keyed async locks serializing work per employee.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per employee id.
///
/// Holding an employee's guard makes "read rows, classify, commit rows and
/// counters" a single unit for that employee. Callers that need several
/// employees use [`EmployeeLocks::acquire_all`], which locks in sorted order.
///
/// Entries are never evicted: the table lives as long as the engine state and
/// grows to one idle mutex per employee ever seen.
#[derive(Debug, Clone, Default)]
pub struct EmployeeLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl EmployeeLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, employee_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(employee_id.to_string()).or_default().clone()
    }

    /// Waits for and takes the lock of one employee.
    pub async fn acquire(&self, employee_id: &str) -> OwnedMutexGuard<()> {
        self.handle(employee_id).await.lock_owned().await
    }

    /// Takes the locks of several employees, in id order.
    pub async fn acquire_all(&self, employee_ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids: Vec<&str> = employee_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for employee_id in ids {
            guards.push(self.acquire(employee_id).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_employee_is_serialized() {
        let locks = EmployeeLocks::new();
        let guard = locks.acquire("E001").await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.acquire("E001").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_employees_do_not_block() {
        let locks = EmployeeLocks::new();
        let _first = locks.acquire("E001").await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire("E002")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_all_deduplicates() {
        let locks = EmployeeLocks::new();
        let ids = vec!["E002".to_string(), "E001".to_string(), "E002".to_string()];
        let guards = locks.acquire_all(&ids).await;
        assert_eq!(guards.len(), 2);
    }
}
