//! Transaction coordinator
//!
//! Composes the lock table, step log, task queue, call cache and the local
//! invocation gateway into the start/send/commit/rollback state machine.
//! Every public operation is one synchronous unit of work against the
//! state store; atomicity of the enclosing call is the host's guarantee.

use crate::config::EngineConfig;
use crate::coordination::cache::CallCache;
use crate::coordination::locks::LockTable;
use crate::coordination::queue::TaskQueue;
use crate::coordination::record::{
    TransactionList, TransactionRecord, TransactionState, TransactionStatus, TransactionStep,
    TransactionSummary,
};
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::gateway::{resource_from_path, InvocationGateway, ResourceInvoker};
use crate::host::{Clock, IdentityResolver};
use crate::metrics;
use crate::store::{keys, StateStore};

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Transaction id sentinel for calls made outside any transaction context
pub const NO_TRANSACTION: &str = "0";

/// One failed compensation call, reported alongside a successful rollback
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationFailure {
    pub seq: u64,
    pub path: String,
    pub method: String,
    pub message: String,
}

/// Outcome of a rollback: the transaction always reaches `RolledBack`,
/// compensation failures are non-fatal and collected here
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutcome {
    pub compensation_failures: Vec<CompensationFailure>,
}

impl RollbackOutcome {
    pub fn is_clean(&self) -> bool {
        self.compensation_failures.is_empty()
    }

    /// Aggregated warning text for the caller, `None` when compensation
    /// went through cleanly
    pub fn warning(&self) -> Option<String> {
        if self.is_clean() {
            return None;
        }
        let mut message = String::from("warning:");
        for failure in &self.compensation_failures {
            message.push_str(&format!(" revert \"{}\" failed.", failure.method));
        }
        Some(message)
    }
}

/// Cross-chain transaction coordinator
pub struct TransactionCoordinator {
    store: Arc<dyn StateStore>,
    gateway: InvocationGateway,
    locks: LockTable,
    queue: TaskQueue,
    cache: CallCache,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl TransactionCoordinator {
    pub fn new(
        store: Arc<dyn StateStore>,
        invoker: Arc<dyn ResourceInvoker>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway: InvocationGateway::new(invoker, config.channel.clone()),
            locks: LockTable::new(store.clone(), config.strict_lock_binding),
            queue: TaskQueue::new(store.clone()),
            cache: CallCache::new(store.clone()),
            store,
            identity,
            clock,
            config,
        }
    }

    /// Engine version string
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Start a transaction: lock every local resource (all-or-nothing),
    /// create the record and enqueue the id for the relay
    pub fn start_transaction(
        &self,
        id: &str,
        local_paths: &[String],
        remote_paths: &[String],
    ) -> CoordinatorResult<()> {
        if id.is_empty() || id == NO_TRANSACTION {
            return Err(CoordinatorError::InvalidArguments(format!(
                "invalid transaction id: {:?}",
                id
            )));
        }

        if self.load_record(id)?.is_some() {
            return Err(CoordinatorError::AlreadyExists { id: id.to_string() });
        }

        // resolve the whole participant set up front, deduplicated by
        // resource name in first-seen order
        let mut participants: Vec<(String, String)> = Vec::new();
        for path in local_paths {
            let resource = resource_from_path(path)?;
            if !participants.iter().any(|(r, _)| r == resource) {
                participants.push((resource.to_string(), path.clone()));
            }
        }

        self.locks.acquire_all(id, &participants)?;

        let mut all_paths: Vec<String> = local_paths.to_vec();
        all_paths.extend(remote_paths.iter().cloned());

        let record = TransactionRecord::new(
            id.to_string(),
            self.identity.caller_identity()?,
            participants.into_iter().map(|(r, _)| r).collect(),
            all_paths,
            self.clock.now(),
        );
        self.save_record(&record)?;
        self.queue.enqueue(id)?;

        metrics::record_transaction_started();
        info!(transaction_id = id, locks = record.participants.len(), "transaction started");
        Ok(())
    }

    /// Apply one step of a transaction, or make an uncoordinated call when
    /// `id` is [`NO_TRANSACTION`]
    ///
    /// Replays under a known `unique_id` are answered from the call cache
    /// without re-execution or re-appending to the step log.
    pub fn send_transaction(
        &self,
        unique_id: &str,
        id: &str,
        seq: u64,
        path: &str,
        method: &str,
        args_json: &str,
    ) -> CoordinatorResult<Vec<u8>> {
        if let Some(payload) = self.cache.lookup(unique_id)? {
            metrics::record_idempotent_replay();
            info!(unique_id, transaction_id = id, "replay answered from call cache");
            return Ok(payload);
        }

        let resource = resource_from_path(path)?;

        if id == NO_TRANSACTION {
            if let Some(entry) = self.locks.holder(resource)? {
                return Err(CoordinatorError::ResourceLocked {
                    path: path.to_string(),
                    holder: entry.transaction_id,
                });
            }
            // uncoordinated calls bypass the step log and the call cache
            return self.gateway.call(resource, method, args_json);
        }

        let mut record = self.require_record(id)?;
        self.check_not_terminal(&record)?;
        self.locks.check_held_by(resource, path, id)?;

        if !record.accepts_seq(seq) {
            return Err(CoordinatorError::SequenceViolation {
                seq,
                last: record.last_seq(),
            });
        }

        record.push_step(TransactionStep {
            seq,
            identity: self.identity.caller_identity()?,
            path: path.to_string(),
            timestamp: self.clock.now(),
            method: method.to_string(),
            args: args_json.to_string(),
        });
        self.save_record(&record)?;

        let payload = self.gateway.call(resource, method, args_json)?;
        self.cache.record(unique_id, &payload)?;

        metrics::record_step_applied();
        info!(transaction_id = id, seq, method, "transaction step applied");
        Ok(payload)
    }

    /// Read-only invocation with lock checks but no side effects on the
    /// transaction record
    pub fn constant_call(
        &self,
        id: &str,
        path: &str,
        method: &str,
        args_json: &str,
    ) -> CoordinatorResult<Vec<u8>> {
        let resource = resource_from_path(path)?;

        if id == NO_TRANSACTION {
            if let Some(entry) = self.locks.holder(resource)? {
                return Err(CoordinatorError::ResourceLocked {
                    path: path.to_string(),
                    holder: entry.transaction_id,
                });
            }
            return self.gateway.call(resource, method, args_json);
        }

        self.require_record(id)?;
        self.locks.check_held_by(resource, path, id)?;
        self.gateway.call(resource, method, args_json)
    }

    /// Commit: terminal, releases every participant lock
    ///
    /// Committing an already-committed transaction is an idempotent no-op.
    pub fn commit_transaction(&self, id: &str) -> CoordinatorResult<()> {
        let mut record = self.require_record(id)?;

        match record.status {
            TransactionStatus::Committed => {
                info!(transaction_id = id, "commit replayed on committed transaction");
                return Ok(());
            }
            TransactionStatus::RolledBack => {
                return Err(CoordinatorError::AlreadyRolledBack { id: id.to_string() });
            }
            TransactionStatus::Processing => {}
        }

        record.status = TransactionStatus::Committed;
        record.committed_at = self.clock.now();
        self.save_record(&record)?;
        self.locks.release_all(&record.participants)?;
        self.queue.push_finished(id)?;

        metrics::record_transaction_committed();
        info!(transaction_id = id, steps = record.steps.len(), "transaction committed");
        Ok(())
    }

    /// Rollback: walk the step log in reverse, invoking each step's
    /// compensating method with the original arguments
    ///
    /// Every step is attempted regardless of earlier failures; the
    /// transaction always reaches `RolledBack` and its locks are always
    /// released. Rolling back an already-rolled-back transaction is an
    /// idempotent no-op with no further compensation.
    pub fn rollback_transaction(&self, id: &str) -> CoordinatorResult<RollbackOutcome> {
        let mut record = self.require_record(id)?;

        match record.status {
            TransactionStatus::RolledBack => {
                info!(transaction_id = id, "rollback replayed on rolled-back transaction");
                return Ok(RollbackOutcome::default());
            }
            TransactionStatus::Committed => {
                return Err(CoordinatorError::AlreadyCommitted { id: id.to_string() });
            }
            TransactionStatus::Processing => {}
        }

        let mut outcome = RollbackOutcome::default();
        for step in record.steps.iter().rev() {
            let revert_method = self.config.revert_method(&step.method);
            let compensation = resource_from_path(&step.path)
                .and_then(|resource| self.gateway.call(resource, &revert_method, &step.args));

            if let Err(e) = compensation {
                warn!(
                    transaction_id = id,
                    seq = step.seq,
                    method = %step.method,
                    error = %e,
                    "compensation failed"
                );
                metrics::record_compensation_failure();
                outcome.compensation_failures.push(CompensationFailure {
                    seq: step.seq,
                    path: step.path.clone(),
                    method: step.method.clone(),
                    message: e.to_string(),
                });
            }
        }

        record.status = TransactionStatus::RolledBack;
        record.rolled_back_at = self.clock.now();
        self.save_record(&record)?;
        self.locks.release_all(&record.participants)?;
        self.queue.push_finished(id)?;

        metrics::record_transaction_rolled_back();
        info!(
            transaction_id = id,
            failures = outcome.compensation_failures.len(),
            "transaction rolled back"
        );
        Ok(outcome)
    }

    /// Rollback, then acknowledge the task-queue head, composed
    pub fn rollback_and_delete_task(&self, id: &str) -> CoordinatorResult<RollbackOutcome> {
        let outcome = self.rollback_transaction(id)?;
        self.queue.advance(id)?;
        Ok(outcome)
    }

    /// Full record of a transaction
    pub fn get_transaction(&self, id: &str) -> CoordinatorResult<TransactionRecord> {
        self.require_record(id)
    }

    /// Record at the task-queue head, `None` when no task is pending
    pub fn get_latest_transaction(&self) -> CoordinatorResult<Option<TransactionRecord>> {
        match self.queue.peek_head()? {
            Some((_, id)) => Ok(Some(self.require_record(&id)?)),
            None => Ok(None),
        }
    }

    /// Number of transactions ever started
    pub fn transaction_count(&self) -> CoordinatorResult<u64> {
        self.queue.len()
    }

    /// Summaries of up to `count` transactions, walking the task list
    /// downward from `start_index` (`-1` meaning the newest)
    ///
    /// A `start_index` outside `1..=total` yields an empty page while
    /// `total` still reports the real list length, so callers can re-page
    /// without a second length query.
    pub fn list_transactions(
        &self,
        start_index: i64,
        count: u64,
    ) -> CoordinatorResult<TransactionList> {
        let total = self.queue.len()?;
        let start = if start_index < 0 {
            total
        } else {
            start_index as u64
        };

        let mut transactions = Vec::new();
        if total > 0 && start >= 1 && start <= total {
            let stop = start.saturating_sub(count) + 1;
            let mut index = start;
            while index >= stop.max(1) {
                if let Some(id) = self.queue.task_at(index)? {
                    let record = self.require_record(&id)?;
                    transactions.push(TransactionSummary {
                        transaction_id: record.transaction_id,
                        identity: record.identity,
                        status: record.status,
                        timestamp: record.started_at,
                        paths: record.all_paths,
                    });
                }
                if index == 1 {
                    break;
                }
                index -= 1;
            }
        }

        Ok(TransactionList {
            total,
            transactions,
        })
    }

    /// Lock view of a resource path: holder id and its last applied seq,
    /// `None` when the resource is unlocked
    pub fn get_transaction_state(&self, path: &str) -> CoordinatorResult<Option<TransactionState>> {
        let resource = resource_from_path(path)?;

        match self.locks.holder(resource)? {
            Some(entry) => {
                let last_seq = self
                    .load_record(&entry.transaction_id)?
                    .map(|r| r.last_seq())
                    .unwrap_or(0);
                Ok(Some(TransactionState {
                    transaction_id: entry.transaction_id,
                    last_seq,
                }))
            }
            None => Ok(None),
        }
    }

    fn load_record(&self, id: &str) -> CoordinatorResult<Option<TransactionRecord>> {
        match self.store.get(&keys::transaction(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn require_record(&self, id: &str) -> CoordinatorResult<TransactionRecord> {
        self.load_record(id)?
            .ok_or_else(|| CoordinatorError::TransactionNotFound { id: id.to_string() })
    }

    fn save_record(&self, record: &TransactionRecord) -> CoordinatorResult<()> {
        self.store.put(
            &keys::transaction(&record.transaction_id),
            serde_json::to_vec(record)?,
        )?;
        Ok(())
    }

    fn check_not_terminal(&self, record: &TransactionRecord) -> CoordinatorResult<()> {
        match record.status {
            TransactionStatus::Committed => Err(CoordinatorError::AlreadyCommitted {
                id: record.transaction_id.clone(),
            }),
            TransactionStatus::RolledBack => Err(CoordinatorError::AlreadyRolledBack {
                id: record.transaction_id.clone(),
            }),
            TransactionStatus::Processing => Ok(()),
        }
    }
}
