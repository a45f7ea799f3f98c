//! Host collaborator traits
//!
//! The engine runs embedded in a host ledger runtime. The host supplies the
//! caller identity (already validated, e.g. extracted from the enrollment
//! certificate) and the per-call timestamp source.

use crate::error::CoordinatorResult;
use chrono::Utc;

/// Resolves the identity of the caller behind the current inbound call
#[cfg_attr(test, mockall::automock)]
pub trait IdentityResolver: Send + Sync {
    /// Opaque, already-validated identity string
    fn caller_identity(&self) -> CoordinatorResult<String>;
}

/// Timestamp source, unix seconds
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Fixed identity, for hosts that authenticate out of band
pub struct StaticIdentity(pub String);

impl IdentityResolver for StaticIdentity {
    fn caller_identity(&self) -> CoordinatorResult<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_sane() {
        // 2020-01-01 as a floor
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn test_static_identity() {
        let id = StaticIdentity("org1/admin".to_string());
        assert_eq!(id.caller_identity().unwrap(), "org1/admin");
    }
}
