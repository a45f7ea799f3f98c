//! Resource lock table
//!
//! Maps a local resource name to the transaction currently holding it.
//! Locks are advisory field comparisons: a caller acting on a locked
//! resource under the wrong transaction id fails immediately, nothing
//! queues or blocks.

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::store::{keys, StateStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Lock table entry: the holding transaction, and in strict-binding mode
/// the exact path the lock was taken under
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Lock table over the state store
pub struct LockTable {
    store: Arc<dyn StateStore>,
    /// Record and verify the lock path, not just the holder id
    strict_binding: bool,
}

impl LockTable {
    pub fn new(store: Arc<dyn StateStore>, strict_binding: bool) -> Self {
        Self {
            store,
            strict_binding,
        }
    }

    /// Current lock entry for a resource, `None` when unlocked
    pub fn holder(&self, resource: &str) -> CoordinatorResult<Option<LockEntry>> {
        match self.store.get(&keys::lock(resource))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Acquire locks for a whole participant set, all-or-nothing
    ///
    /// Availability is verified for every `(resource, path)` pair before any
    /// lock is written, so a conflict leaves no lock behind.
    pub fn acquire_all(
        &self,
        transaction_id: &str,
        participants: &[(String, String)],
    ) -> CoordinatorResult<()> {
        for (resource, path) in participants {
            if let Some(entry) = self.holder(resource)? {
                return Err(CoordinatorError::ResourceLocked {
                    path: path.clone(),
                    holder: entry.transaction_id,
                });
            }
        }

        for (resource, path) in participants {
            let entry = LockEntry {
                transaction_id: transaction_id.to_string(),
                path: self.strict_binding.then(|| path.clone()),
            };
            self.store
                .put(&keys::lock(resource), serde_json::to_vec(&entry)?)?;
            debug!(resource, transaction_id, "resource locked");
        }

        Ok(())
    }

    /// Verify that `transaction_id` holds `resource`, presented via `path`
    pub fn check_held_by(
        &self,
        resource: &str,
        path: &str,
        transaction_id: &str,
    ) -> CoordinatorResult<()> {
        let entry = self.holder(resource)?;

        let registered = match &entry {
            Some(e) if e.transaction_id == transaction_id => match (&e.path, self.strict_binding)
            {
                (Some(locked_path), true) => locked_path.as_str() == path,
                _ => true,
            },
            _ => false,
        };

        if registered {
            Ok(())
        } else {
            Err(CoordinatorError::Unregistered {
                path: path.to_string(),
                id: transaction_id.to_string(),
            })
        }
    }

    /// Release every lock held for the given resources
    pub fn release_all(&self, resources: &[String]) -> CoordinatorResult<()> {
        for resource in resources {
            self.store.delete(&keys::lock(resource))?;
            debug!(resource, "resource lock released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn table(strict: bool) -> LockTable {
        LockTable::new(Arc::new(MemoryStore::new()), strict)
    }

    fn pair(resource: &str) -> (String, String) {
        (resource.to_string(), format!("pay.chain0.{}", resource))
    }

    #[test]
    fn test_acquire_and_release() {
        let locks = table(false);
        locks.acquire_all("tx1", &[pair("A"), pair("B")]).unwrap();

        assert_eq!(locks.holder("A").unwrap().unwrap().transaction_id, "tx1");
        assert_eq!(locks.holder("B").unwrap().unwrap().transaction_id, "tx1");

        locks
            .release_all(&["A".to_string(), "B".to_string()])
            .unwrap();
        assert!(locks.holder("A").unwrap().is_none());
        assert!(locks.holder("B").unwrap().is_none());
    }

    #[test]
    fn test_conflict_leaves_no_partial_locks() {
        let locks = table(false);
        locks.acquire_all("tx1", &[pair("B")]).unwrap();

        // A is free but B is held, so nothing may be acquired
        let err = locks
            .acquire_all("tx2", &[pair("A"), pair("B")])
            .unwrap_err();
        assert!(matches!(
            err,
            CoordinatorError::ResourceLocked { ref holder, .. } if holder == "tx1"
        ));
        assert!(locks.holder("A").unwrap().is_none());
    }

    #[test]
    fn test_check_held_by() {
        let locks = table(false);
        locks.acquire_all("tx1", &[pair("A")]).unwrap();

        locks.check_held_by("A", "pay.chain0.A", "tx1").unwrap();
        assert!(locks.check_held_by("A", "pay.chain0.A", "tx2").is_err());
        assert!(locks.check_held_by("Unlocked", "pay.chain0.Unlocked", "tx1").is_err());
    }

    #[test]
    fn test_strict_binding_pins_the_path() {
        let locks = table(true);
        locks.acquire_all("tx1", &[pair("A")]).unwrap();

        locks.check_held_by("A", "pay.chain0.A", "tx1").unwrap();
        // same resource, different declared path
        assert!(matches!(
            locks.check_held_by("A", "other.chain9.A", "tx1"),
            Err(CoordinatorError::Unregistered { .. })
        ));
    }
}
