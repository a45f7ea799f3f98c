//! Prometheus metrics for the coordinator
//!
//! Exposes counters for:
//! - Transaction lifecycle (started, committed, rolled back)
//! - Step application and compensation failures
//! - Idempotent replays
//! - Interchain request registration

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    // Transaction lifecycle metrics
    pub static ref TX_STARTED: CounterVec = register_counter_vec!(
        "causeway_transactions_started_total",
        "Total transactions started",
        &[]
    ).unwrap();

    pub static ref TX_COMMITTED: CounterVec = register_counter_vec!(
        "causeway_transactions_committed_total",
        "Total transactions committed",
        &[]
    ).unwrap();

    pub static ref TX_ROLLED_BACK: CounterVec = register_counter_vec!(
        "causeway_transactions_rolledback_total",
        "Total transactions rolled back",
        &[]
    ).unwrap();

    // Step metrics
    pub static ref STEPS_APPLIED: CounterVec = register_counter_vec!(
        "causeway_steps_applied_total",
        "Total transaction steps applied",
        &[]
    ).unwrap();

    pub static ref COMPENSATION_FAILURES: CounterVec = register_counter_vec!(
        "causeway_compensation_failures_total",
        "Total compensation calls that failed during rollback",
        &[]
    ).unwrap();

    // Dedup metrics
    pub static ref IDEMPOTENT_REPLAYS: CounterVec = register_counter_vec!(
        "causeway_idempotent_replays_total",
        "Total sendTransaction calls answered from the call cache",
        &[]
    ).unwrap();

    // Request ledger metrics
    pub static ref INTERCHAIN_REQUESTS: CounterVec = register_counter_vec!(
        "causeway_interchain_requests_total",
        "Total interchain requests registered, by call type",
        &["call_type"]
    ).unwrap();
}

// Helper functions to record metrics

pub fn record_transaction_started() {
    TX_STARTED.with_label_values(&[]).inc();
}

pub fn record_transaction_committed() {
    TX_COMMITTED.with_label_values(&[]).inc();
}

pub fn record_transaction_rolled_back() {
    TX_ROLLED_BACK.with_label_values(&[]).inc();
}

pub fn record_step_applied() {
    STEPS_APPLIED.with_label_values(&[]).inc();
}

pub fn record_compensation_failure() {
    COMPENSATION_FAILURES.with_label_values(&[]).inc();
}

pub fn record_idempotent_replay() {
    IDEMPOTENT_REPLAYS.with_label_values(&[]).inc();
}

pub fn record_interchain_request(call_type: &str) {
    INTERCHAIN_REQUESTS.with_label_values(&[call_type]).inc();
}
