//! Request ledger for fire-and-forget interchain calls
//!
//! A monotonically-incrementing log of outbound interchain requests with a
//! separately advanced delivered cursor, used when the coordinator is not
//! needed. The relay polls `list_pending`, moves the requests, and
//! acknowledges with `acknowledge_up_to`; remote chains report results back
//! through `register_callback_result`.

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::host::IdentityResolver;
use crate::metrics;
use crate::store::{keys, read_counter, write_counter, StateStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Kind of interchain call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    #[serde(rename = "0")]
    Query,
    #[serde(rename = "1")]
    Invoke,
}

impl CallType {
    fn name(&self) -> &'static str {
        match self {
            CallType::Query => "query",
            CallType::Invoke => "invoke",
        }
    }
}

/// One outbound interchain request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchainRequest {
    pub id: u64,
    pub call_type: CallType,
    pub path: String,
    pub method: String,
    /// Raw JSON argument blob, forwarded as-is
    pub args: String,
    pub callback_path: String,
    pub callback_method: String,
    /// Requester identity recorded at registration
    pub identity: String,
}

/// Result reported back by the remote chain's callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResult {
    pub seq: u64,
    pub error_code: i64,
    pub error_message: String,
    pub result: String,
}

/// Hub-style interchain request ledger
pub struct RequestLedger {
    store: Arc<dyn StateStore>,
    identity: Arc<dyn IdentityResolver>,
}

impl RequestLedger {
    pub fn new(store: Arc<dyn StateStore>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { store, identity }
    }

    /// Highest request id ever assigned
    pub fn increment(&self) -> CoordinatorResult<u64> {
        Ok(read_counter(self.store.as_ref(), keys::REQUEST_INCREMENT)?)
    }

    /// Highest request id the relay has acknowledged
    pub fn delivered_cursor(&self) -> CoordinatorResult<u64> {
        Ok(read_counter(self.store.as_ref(), keys::REQUEST_CURSOR)?)
    }

    /// Register an outbound interchain request, returning its assigned id
    pub fn register(
        &self,
        call_type: CallType,
        path: &str,
        method: &str,
        args: &str,
        callback_path: &str,
        callback_method: &str,
    ) -> CoordinatorResult<u64> {
        let id = self.increment()? + 1;

        let request = InterchainRequest {
            id,
            call_type,
            path: path.to_string(),
            method: method.to_string(),
            args: args.to_string(),
            callback_path: callback_path.to_string(),
            callback_method: callback_method.to_string(),
            identity: self.identity.caller_identity()?,
        };

        write_counter(self.store.as_ref(), keys::REQUEST_INCREMENT, id)?;
        self.store
            .put(&keys::request(id), serde_json::to_vec(&request)?)?;

        metrics::record_interchain_request(call_type.name());
        info!(request_id = id, path, method, "interchain request registered");
        Ok(id)
    }

    /// Requests strictly after the delivered cursor, up to `count`
    pub fn list_pending(&self, count: u64) -> CoordinatorResult<Vec<InterchainRequest>> {
        let total = self.increment()?;
        let current = self.delivered_cursor()?;
        if total == current {
            return Ok(Vec::new());
        }

        let take = count.min(total - current);
        let mut requests = Vec::with_capacity(take as usize);
        for offset in 0..take {
            let id = current + offset + 1;
            let bytes = self
                .store
                .get(&keys::request(id))?
                .ok_or(CoordinatorError::RequestNotFound { id })?;
            requests.push(serde_json::from_slice(&bytes)?);
        }

        Ok(requests)
    }

    /// Advance the delivered cursor, monotonic and bounded
    ///
    /// Moves only when `cursor < id <= increment`; attempts to move backward
    /// or past the known maximum are silently ignored.
    pub fn acknowledge_up_to(&self, id: u64) -> CoordinatorResult<()> {
        let total = self.increment()?;
        let current = self.delivered_cursor()?;

        if current < id && id <= total {
            write_counter(self.store.as_ref(), keys::REQUEST_CURSOR, id)?;
            debug!(request_id = id, "delivered cursor advanced");
        }
        Ok(())
    }

    /// Record the remote chain's callback result, last-write-wins
    ///
    /// No ordering check against `seq`: the caller is trusted to supply a
    /// monotonically fresher callback.
    pub fn register_callback_result(
        &self,
        id: u64,
        seq: u64,
        error_code: i64,
        error_message: &str,
        result: &str,
    ) -> CoordinatorResult<()> {
        let callback = CallbackResult {
            seq,
            error_code,
            error_message: error_message.to_string(),
            result: result.to_string(),
        };
        self.store
            .put(&keys::callback(id), serde_json::to_vec(&callback)?)?;
        debug!(request_id = id, seq, "callback result registered");
        Ok(())
    }

    /// Callback result for a request, if one has arrived
    pub fn callback_result(&self, id: u64) -> CoordinatorResult<Option<CallbackResult>> {
        match self.store.get(&keys::callback(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
