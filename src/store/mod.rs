//! State store adapter and key layout
//!
//! The host ledger runtime provides the durable key-value store; every
//! public engine operation runs as one atomic unit of work against it.
//! The engine only depends on the [`StateStore`] trait. [`MemoryStore`]
//! is the in-process adapter used for embedding and tests.

mod memory;

pub use memory::MemoryStore;

use thiserror::Error;

/// Error surfaced by a state store adapter
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered key -> bytes store with per-call atomicity provided by the host
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Key construction for every record the engine persists
pub mod keys {
    /// Lock table entry for a local resource
    pub fn lock(resource: &str) -> String {
        format!("lock/{}", resource)
    }

    /// Full transaction record
    pub fn transaction(id: &str) -> String {
        format!("tx/{}/info", id)
    }

    /// Task queue entry at a 1-based index
    pub fn task(index: u64) -> String {
        format!("tx-task/{}", index)
    }

    /// Task queue length counter
    pub const TASK_LEN: &str = "tx-queue-len";

    /// Task queue head cursor
    pub const TASK_HEAD: &str = "tx-queue-head";

    /// Finished-list entry at a 1-based index
    pub fn finished(index: u64) -> String {
        format!("finished/{}", index)
    }

    /// Finished-list length counter
    pub const FINISHED_LEN: &str = "finished-len";

    /// Idempotent call result for a caller-supplied unique id
    pub fn result(unique_id: &str) -> String {
        format!("result/{}", unique_id)
    }

    /// Interchain request entry
    pub fn request(id: u64) -> String {
        format!("req/{}", id)
    }

    /// Callback result for an interchain request
    pub fn callback(id: u64) -> String {
        format!("req-callback/{}", id)
    }

    /// Request ledger increment counter
    pub const REQUEST_INCREMENT: &str = "req-increment";

    /// Request ledger delivered cursor
    pub const REQUEST_CURSOR: &str = "req-cursor";
}

/// Read a decimal counter, treating an absent key as zero
pub fn read_counter(store: &dyn StateStore, key: &str) -> StoreResult<u64> {
    match store.get(key)? {
        Some(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| StoreError(format!("counter {} is not utf-8: {}", key, e)))?;
            text.parse::<u64>()
                .map_err(|e| StoreError(format!("counter {} is not a number: {}", key, e)))
        }
        None => Ok(0),
    }
}

/// Write a decimal counter
pub fn write_counter(store: &dyn StateStore, key: &str, value: u64) -> StoreResult<()> {
    store.put(key, value.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(keys::lock("Ledger1"), "lock/Ledger1");
        assert_eq!(keys::transaction("tx1"), "tx/tx1/info");
        assert_eq!(keys::task(7), "tx-task/7");
        assert_eq!(keys::request(3), "req/3");
    }

    #[test]
    fn test_counter_defaults_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(read_counter(&store, keys::TASK_LEN).unwrap(), 0);

        write_counter(&store, keys::TASK_LEN, 42).unwrap();
        assert_eq!(read_counter(&store, keys::TASK_LEN).unwrap(), 42);
    }

    #[test]
    fn test_malformed_counter_is_an_error() {
        let store = MemoryStore::new();
        store
            .put(keys::TASK_HEAD, b"not-a-number".to_vec())
            .unwrap();
        assert!(read_counter(&store, keys::TASK_HEAD).is_err());
    }
}
