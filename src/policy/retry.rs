use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::decode_or_skip;
use crate::constants::RETRY_CATEGORY;
use crate::constants::WILDCARD_METHOD;
use crate::metrics::record_rejection;
use crate::metrics::record_update;
use crate::ConfigCallback;
use crate::ConfigParser;
use crate::ThreadSafeSet;
use crate::ValueFormat;

/// Circuit-breaker condition that stops retrying
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CbPolicy {
    #[serde(alias = "errorRate")]
    pub error_rate: f64,
}

/// When retrying stops
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPolicy {
    #[serde(alias = "maxRetryTimes")]
    pub max_retry_times: u32,
    #[serde(alias = "maxDurationMs", alias = "maxDurationMS")]
    pub max_duration_ms: u32,
    #[serde(alias = "disableChainStop")]
    pub disable_chain_stop: bool,
    #[serde(alias = "ddlStop")]
    pub ddl_stop: bool,
    #[serde(alias = "cbPolicy")]
    pub cb_policy: CbPolicy,
}

/// Delay between attempts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// `none`, `fixed` or `random`
    #[serde(alias = "backoffType")]
    pub backoff_type: String,
    #[serde(alias = "cfgItems")]
    pub cfg_items: HashMap<String, f64>,
}

/// Retry after a failed attempt
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    #[serde(alias = "stopPolicy")]
    pub stop_policy: StopPolicy,
    #[serde(alias = "backoffPolicy", skip_serializing_if = "Option::is_none")]
    pub backoff_policy: Option<BackoffPolicy>,
    #[serde(alias = "retrySameNode")]
    pub retry_same_node: bool,
}

/// Send a backup request when the first one is slow
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPolicy {
    #[serde(alias = "retryDelayMs", alias = "retryDelayMS")]
    pub retry_delay_ms: u32,
    #[serde(alias = "stopPolicy")]
    pub stop_policy: StopPolicy,
    #[serde(alias = "retrySameNode")]
    pub retry_same_node: bool,
}

/// Retry policy of one method
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub enable: bool,
    /// 0 for failure retry, 1 for backup request
    #[serde(rename = "type")]
    pub policy_type: i32,
    #[serde(alias = "failurePolicy", skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,
    #[serde(alias = "backupPolicy", skip_serializing_if = "Option::is_none")]
    pub backup_policy: Option<BackupPolicy>,
}

impl RetryPolicy {
    /// An enabled policy must carry at least one strategy.
    pub fn is_valid(&self) -> bool {
        !(self.enable && self.backup_policy.is_none() && self.failure_policy.is_none())
    }
}

/// Per-method retry policies of one destination service.
///
/// Reads go through a concurrent map; writes only come from the watch
/// callback.
#[derive(Debug, Default)]
pub struct RetryContainer {
    policies: DashMap<String, RetryPolicy>,

    /// Methods described by the last applied document
    tracked: ThreadSafeSet,
}

impl RetryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_policy_change(
        &self,
        method: &str,
        policy: RetryPolicy,
    ) {
        self.policies.insert(method.to_string(), policy);
    }

    pub fn delete_policy(
        &self,
        method: &str,
    ) {
        self.policies.remove(method);
    }

    /// Policy for `method`, falling back to the wildcard entry
    pub fn policy(
        &self,
        method: &str,
    ) -> Option<RetryPolicy> {
        self.policies
            .get(method)
            .or_else(|| self.policies.get(WILDCARD_METHOD))
            .map(|p| p.value().clone())
    }

    pub fn methods(&self) -> HashSet<String> {
        self.policies.iter().map(|e| e.key().clone()).collect()
    }

    pub fn tracked_methods(&self) -> HashSet<String> {
        self.tracked.snapshot()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Converges the container to exactly the valid entries of `batch`.
    ///
    /// Invalid entries are skipped with a warning; methods no longer described
    /// are deleted.
    pub fn reconcile(
        &self,
        dest: &str,
        batch: HashMap<String, RetryPolicy>,
    ) {
        let mut described = HashSet::with_capacity(batch.len());
        for (method, policy) in batch {
            if !policy.is_valid() {
                warn!(
                    "[consul] {} client policy for method {} BackupPolicy and FailurePolicy must not be empty at same time",
                    dest, method
                );
                record_rejection(RETRY_CATEGORY);
                continue;
            }
            self.notify_policy_change(&method, policy);
            described.insert(method);
        }

        for method in self.tracked.diff_and_emplace(described) {
            debug!(dest, method = %method, "retry policy removed");
            self.delete_policy(&method);
        }
    }

    /// Callback that decodes a `method -> policy` document and reconciles.
    pub fn callback(
        self: &Arc<Self>,
        key: &str,
        kind: ValueFormat,
        dest: &str,
    ) -> ConfigCallback {
        let container = self.clone();
        let key = key.to_string();
        let dest = dest.to_string();
        Arc::new(move |data: &str, parser: &dyn ConfigParser| {
            let Some(batch) =
                decode_or_skip::<HashMap<String, RetryPolicy>>(parser, kind, data, &key, RETRY_CATEGORY)
            else {
                return;
            };
            container.reconcile(&dest, batch);
            record_update(RETRY_CATEGORY);
        })
    }

    /// Drops every policy; the framework's close callback.
    pub fn close(&self) {
        self.policies.clear();
        self.tracked.diff_and_emplace(HashSet::new());
    }
}
