//! Task queue and finished list
//!
//! An append-only FIFO of transaction ids with a head cursor, polled and
//! acknowledged by the external relay: fetch the head, act on it, then
//! request deletion, which only succeeds while the head is unchanged.
//! A separate append-only finished list records ids that reached a
//! terminal state, independent of queue consumption.

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::store::{keys, read_counter, write_counter, StateStore};
use std::sync::Arc;
use tracing::debug;

/// FIFO over `(index, transaction id)`, 1-based dense index
pub struct TaskQueue {
    store: Arc<dyn StateStore>,
}

impl TaskQueue {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Number of ids ever enqueued
    pub fn len(&self) -> CoordinatorResult<u64> {
        Ok(read_counter(self.store.as_ref(), keys::TASK_LEN)?)
    }

    pub fn is_empty(&self) -> CoordinatorResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Oldest unacknowledged index; entries below it are consumed
    fn head(&self) -> CoordinatorResult<u64> {
        let head = read_counter(self.store.as_ref(), keys::TASK_HEAD)?;
        // the index space starts at 1
        Ok(head.max(1))
    }

    /// Append a transaction id at `len + 1`
    pub fn enqueue(&self, transaction_id: &str) -> CoordinatorResult<()> {
        let index = self.len()? + 1;
        self.store
            .put(&keys::task(index), transaction_id.as_bytes().to_vec())?;
        write_counter(self.store.as_ref(), keys::TASK_LEN, index)?;
        debug!(transaction_id, index, "transaction enqueued");
        Ok(())
    }

    /// Transaction id at a given index, if present
    fn id_at(&self, index: u64) -> CoordinatorResult<Option<String>> {
        match self.store.get(&keys::task(index))? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes).map_err(|e| {
                CoordinatorError::InvalidArguments(format!("task entry is not utf-8: {}", e))
            })?)),
            None => Ok(None),
        }
    }

    /// Entry at the head cursor, `None` when the queue is exhausted
    pub fn peek_head(&self) -> CoordinatorResult<Option<(u64, String)>> {
        let head = self.head()?;
        if head > self.len()? {
            return Ok(None);
        }
        Ok(self.id_at(head)?.map(|id| (head, id)))
    }

    /// Acknowledge the head entry and advance past it
    ///
    /// Fails when the head does not carry `expected_id`, guarding against
    /// double-acknowledgement and out-of-order pops.
    pub fn advance(&self, expected_id: &str) -> CoordinatorResult<()> {
        let (head, id) = self
            .peek_head()?
            .ok_or_else(|| CoordinatorError::TaskMismatch {
                expected: expected_id.to_string(),
            })?;

        if id != expected_id {
            return Err(CoordinatorError::TaskMismatch {
                expected: expected_id.to_string(),
            });
        }

        write_counter(self.store.as_ref(), keys::TASK_HEAD, head + 1)?;
        debug!(transaction_id = expected_id, "task acknowledged");
        Ok(())
    }

    /// Record a transaction id that reached a terminal state
    pub fn push_finished(&self, transaction_id: &str) -> CoordinatorResult<()> {
        let index = read_counter(self.store.as_ref(), keys::FINISHED_LEN)? + 1;
        self.store
            .put(&keys::finished(index), transaction_id.as_bytes().to_vec())?;
        write_counter(self.store.as_ref(), keys::FINISHED_LEN, index)?;
        Ok(())
    }

    /// Number of ids on the finished list
    pub fn finished_count(&self) -> CoordinatorResult<u64> {
        Ok(read_counter(self.store.as_ref(), keys::FINISHED_LEN)?)
    }

    /// Transaction id stored on the task list at a 1-based index
    pub fn task_at(&self, index: u64) -> CoordinatorResult<Option<String>> {
        if index == 0 || index > self.len()? {
            return Ok(None);
        }
        self.id_at(index)
    }
}
