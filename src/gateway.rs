//! Local invocation gateway
//!
//! Resolves dotted resource paths and forwards method calls to local
//! resources through the host's cross-resource invocation primitive. The
//! gateway does no transaction bookkeeping; only the coordinator decides
//! whether a call is lock-checked.

use crate::error::{CoordinatorError, CoordinatorResult};
use std::sync::Arc;
use tracing::debug;

const PATH_SEPARATOR: char = '.';

/// Host primitive that invokes a named local resource
///
/// `frames` carry the method name first, then the positional arguments,
/// as raw bytes. The payload of a successful invocation is returned
/// unmodified; a failed invocation surfaces its error message.
#[cfg_attr(test, mockall::automock)]
pub trait ResourceInvoker: Send + Sync {
    fn invoke(
        &self,
        channel: &str,
        resource: &str,
        frames: &[Vec<u8>],
    ) -> Result<Vec<u8>, InvokeError>;
}

/// Failure reported by the invoked resource
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct InvokeError {
    pub message: String,
}

impl InvokeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolve a three-part dotted path (`network.chain.resource`) to the
/// trailing local resource name
pub fn resource_from_path(path: &str) -> CoordinatorResult<&str> {
    let parts: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(CoordinatorError::InvalidPath(path.to_string()));
    }
    Ok(parts[2])
}

/// Forwards method calls to local resources
pub struct InvocationGateway {
    invoker: Arc<dyn ResourceInvoker>,
    channel: String,
}

impl InvocationGateway {
    pub fn new(invoker: Arc<dyn ResourceInvoker>, channel: String) -> Self {
        Self { invoker, channel }
    }

    /// Call `method` on `resource` with a JSON-encoded argument list,
    /// returning the raw response payload unmodified
    pub fn call(
        &self,
        resource: &str,
        method: &str,
        args_json: &str,
    ) -> CoordinatorResult<Vec<u8>> {
        let args: Vec<String> = serde_json::from_str(args_json)?;

        let mut frames: Vec<Vec<u8>> = Vec::with_capacity(args.len() + 1);
        frames.push(method.as_bytes().to_vec());
        for arg in &args {
            frames.push(arg.as_bytes().to_vec());
        }

        debug!(resource, method, "forwarding local invocation");

        self.invoker
            .invoke(&self.channel, resource, &frames)
            .map_err(|e| CoordinatorError::Invocation(e.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_from_path() {
        assert_eq!(resource_from_path("payment.chain0.Ledger1").unwrap(), "Ledger1");
    }

    #[test]
    fn test_invalid_paths_rejected() {
        for path in ["Ledger1", "a.b", "a.b.c.d", "a..c", ""] {
            assert!(matches!(
                resource_from_path(path),
                Err(CoordinatorError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_call_prepends_method_frame() {
        let mut invoker = MockResourceInvoker::new();
        invoker
            .expect_invoke()
            .withf(|channel, resource, frames| {
                channel == "mychannel"
                    && resource == "Ledger1"
                    && frames == [b"set".to_vec(), b"k".to_vec(), b"v".to_vec()]
            })
            .times(1)
            .returning(|_, _, _| Ok(b"done".to_vec()));

        let gateway = InvocationGateway::new(Arc::new(invoker), "mychannel".to_string());
        let payload = gateway
            .call("Ledger1", "set", "[\"k\",\"v\"]")
            .unwrap();
        assert_eq!(payload, b"done");
    }

    #[test]
    fn test_call_passes_failure_through() {
        let mut invoker = MockResourceInvoker::new();
        invoker
            .expect_invoke()
            .returning(|_, _, _| Err(InvokeError::new("balance too low")));

        let gateway = InvocationGateway::new(Arc::new(invoker), String::new());
        let err = gateway.call("Ledger1", "sub", "[]").unwrap_err();
        assert!(matches!(err, CoordinatorError::Invocation(m) if m == "balance too low"));
    }

    #[test]
    fn test_call_rejects_malformed_args() {
        let invoker = MockResourceInvoker::new();
        let gateway = InvocationGateway::new(Arc::new(invoker), String::new());
        assert!(matches!(
            gateway.call("Ledger1", "set", "not json"),
            Err(CoordinatorError::Codec(_))
        ));
    }
}
