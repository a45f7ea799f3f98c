//! Idempotent call cache
//!
//! Maps a caller-supplied unique id to the raw result of the first
//! successful execution. Entries are write-once and never deleted, so a
//! replay always observes the original outcome.

use crate::error::CoordinatorResult;
use crate::store::{keys, StateStore};
use std::sync::Arc;

/// Idempotent result cache over the state store
pub struct CallCache {
    store: Arc<dyn StateStore>,
}

impl CallCache {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Result of a previous execution under this unique id, if any
    pub fn lookup(&self, unique_id: &str) -> CoordinatorResult<Option<Vec<u8>>> {
        Ok(self.store.get(&keys::result(unique_id))?)
    }

    /// Record the first successful result for a unique id
    ///
    /// An existing entry is left untouched; replays must keep seeing the
    /// original payload.
    pub fn record(&self, unique_id: &str, payload: &[u8]) -> CoordinatorResult<()> {
        if self.lookup(unique_id)?.is_some() {
            return Ok(());
        }
        self.store.put(&keys::result(unique_id), payload.to_vec())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_lookup_miss_then_hit() {
        let cache = CallCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.lookup("u1").unwrap(), None);

        cache.record("u1", b"payload").unwrap();
        assert_eq!(cache.lookup("u1").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_record_is_write_once() {
        let cache = CallCache::new(Arc::new(MemoryStore::new()));
        cache.record("u1", b"first").unwrap();
        cache.record("u1", b"second").unwrap();
        assert_eq!(cache.lookup("u1").unwrap(), Some(b"first".to_vec()));
    }
}
