//! Causeway Coordinator - cross-chain XA/saga transaction coordination
//!
//! This engine gives callers a saga-style distributed transaction across
//! independently operated ledgers: lock local resources, apply a sequence
//! of steps, then commit or compensate all of them, while an external relay
//! moves messages between chains and polls the task queue and request
//! ledger for pending work.
//!
//! The engine is synchronous and host-embedded: the host ledger runtime
//! invokes one operation per inbound call and provides the durable state
//! store, the local resource invocation primitive, and the validated caller
//! identity.

pub mod config;
pub mod coordination;
pub mod error;
pub mod gateway;
pub mod host;
pub mod ledger;
pub mod metrics;
pub mod store;

pub use config::EngineConfig;
pub use coordination::{
    RollbackOutcome, TransactionCoordinator, TransactionRecord, TransactionStatus, NO_TRANSACTION,
};
pub use error::{CoordinatorError, CoordinatorResult};
pub use gateway::{InvokeError, ResourceInvoker};
pub use host::{Clock, IdentityResolver, SystemClock};
pub use ledger::{CallType, RequestLedger};
pub use store::{MemoryStore, StateStore};
