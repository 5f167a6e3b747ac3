//! Narrow interfaces the RPC framework consumes.
//!
//! The framework pulls policy through these on every call; the containers in
//! [`crate::policy`] implement them.

#[cfg(test)]
use mockall::automock;

use crate::LimitOption;
use crate::RpcTimeout;

/// Per-method RPC timeouts
pub trait TimeoutProvider: Send + Sync {
    fn timeouts(
        &self,
        method: &str,
    ) -> Option<RpcTimeout>;
}

/// Receives new connection and QPS limits from the limiter container.
///
/// Returns `false` when the new limits could not be applied.
#[cfg_attr(test, automock)]
pub trait LimitUpdater: Send + Sync {
    fn update_limit(
        &self,
        option: &LimitOption,
    ) -> bool;
}

/// Request was rejected before dispatch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request to `{method}` rejected by {rule}")]
pub struct AclRejection {
    pub method: String,
    pub rule: &'static str,
}

/// Admission check run before a request is sent
pub trait AclRule: Send + Sync {
    fn check(
        &self,
        method: &str,
    ) -> Result<(), AclRejection>;
}
