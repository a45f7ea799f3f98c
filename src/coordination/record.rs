//! Transaction records and the step log

use serde::{Deserialize, Serialize};

/// Lifecycle of a coordinated transaction
///
/// `Processing` is the only non-terminal state; once a transaction commits
/// or rolls back its status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Processing,
    Committed,
    RolledBack,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Processing)
    }
}

/// One applied step of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStep {
    pub seq: u64,
    pub identity: String,
    pub path: String,
    pub timestamp: i64,
    pub method: String,
    /// Raw JSON argument blob, replayed verbatim during compensation
    pub args: String,
}

/// Full record of a coordinated transaction
///
/// Persisted as field-named JSON under `tx/{id}/info`. `seqs` mirrors the
/// `seq` of each entry in `steps` so monotonicity checks stay O(1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub identity: String,
    /// Local resource names locked by this transaction
    pub participants: Vec<String>,
    /// Every declared path, local and remote, for reporting
    pub all_paths: Vec<String>,
    pub status: TransactionStatus,
    pub started_at: i64,
    pub committed_at: i64,
    pub rolled_back_at: i64,
    pub seqs: Vec<u64>,
    pub steps: Vec<TransactionStep>,
}

impl TransactionRecord {
    pub fn new(
        transaction_id: String,
        identity: String,
        participants: Vec<String>,
        all_paths: Vec<String>,
        started_at: i64,
    ) -> Self {
        Self {
            transaction_id,
            identity,
            participants,
            all_paths,
            status: TransactionStatus::Processing,
            started_at,
            committed_at: 0,
            rolled_back_at: 0,
            seqs: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Highest recorded sequence number, 0 when no step has been applied
    pub fn last_seq(&self) -> u64 {
        self.seqs.last().copied().unwrap_or(0)
    }

    /// A new step's seq must be strictly greater than every recorded one
    pub fn accepts_seq(&self, seq: u64) -> bool {
        match self.seqs.last() {
            Some(last) => seq > *last,
            None => true,
        }
    }

    /// Append a step, keeping `steps` and `seqs` in lockstep
    pub fn push_step(&mut self, step: TransactionStep) {
        self.seqs.push(step.seq);
        self.steps.push(step);
    }
}

/// Summary row returned by transaction listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub transaction_id: String,
    pub identity: String,
    pub status: TransactionStatus,
    pub timestamp: i64,
    pub paths: Vec<String>,
}

/// Result of a transaction listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionList {
    pub total: u64,
    pub transactions: Vec<TransactionSummary>,
}

/// Lock view of a resource path: the holding transaction and its last seq
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    pub transaction_id: String,
    pub last_seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            "tx1".to_string(),
            "org1/admin".to_string(),
            vec!["Ledger1".to_string()],
            vec!["pay.chain0.Ledger1".to_string()],
            1_700_000_000,
        )
    }

    #[test]
    fn test_new_record_is_processing() {
        let r = record();
        assert_eq!(r.status, TransactionStatus::Processing);
        assert!(!r.status.is_terminal());
        assert_eq!(r.committed_at, 0);
        assert_eq!(r.rolled_back_at, 0);
    }

    #[test]
    fn test_seq_must_strictly_increase() {
        let mut r = record();
        assert!(r.accepts_seq(1));
        r.push_step(TransactionStep {
            seq: 1,
            identity: String::new(),
            path: "pay.chain0.Ledger1".to_string(),
            timestamp: 0,
            method: "set".to_string(),
            args: "[]".to_string(),
        });

        assert_eq!(r.last_seq(), 1);
        assert!(!r.accepts_seq(1));
        assert!(!r.accepts_seq(0));
        assert!(r.accepts_seq(2));
        assert_eq!(r.seqs.len(), r.steps.len());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::RolledBack).unwrap(),
            "\"rolledback\""
        );
    }

    #[test]
    fn test_record_round_trips_field_named() {
        let r = record();
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"transactionId\":\"tx1\""));
        assert!(json.contains("\"startedAt\""));

        let back: TransactionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.transaction_id, "tx1");
        assert_eq!(back.status, TransactionStatus::Processing);
    }
}
