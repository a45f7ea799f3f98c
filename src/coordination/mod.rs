//! Transaction coordination
//!
//! The coordinator:
//! 1. Locks local resources for the lifetime of a transaction
//! 2. Records applied steps with strictly increasing sequence numbers
//! 3. Commits, or rolls back via best-effort compensation
//! 4. Queues transaction ids for the external relay to poll and acknowledge

pub mod cache;
pub mod coordinator;
pub mod locks;
pub mod queue;
pub mod record;

pub use cache::CallCache;
pub use coordinator::{
    CompensationFailure, RollbackOutcome, TransactionCoordinator, NO_TRANSACTION,
};
pub use locks::{LockEntry, LockTable};
pub use queue::TaskQueue;
pub use record::{
    TransactionList, TransactionRecord, TransactionState, TransactionStatus, TransactionStep,
    TransactionSummary,
};
