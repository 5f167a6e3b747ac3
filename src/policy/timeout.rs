use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;

use super::decode_or_skip;
use crate::constants::RPC_TIMEOUT_CATEGORY;
use crate::constants::WILDCARD_METHOD;
use crate::metrics::record_update;
use crate::ConfigCallback;
use crate::ConfigParser;
use crate::TimeoutProvider;
use crate::ValueFormat;

/// Timeouts of one method; zero means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcTimeout {
    #[serde(alias = "rpcTimeoutMs", alias = "rpc_timeout")]
    pub rpc_timeout_ms: u64,
    #[serde(alias = "connTimeoutMs", alias = "conn_timeout")]
    pub conn_timeout_ms: u64,
}

impl RpcTimeout {
    pub fn rpc_timeout(&self) -> Option<Duration> {
        (self.rpc_timeout_ms > 0).then(|| Duration::from_millis(self.rpc_timeout_ms))
    }

    pub fn conn_timeout(&self) -> Option<Duration> {
        (self.conn_timeout_ms > 0).then(|| Duration::from_millis(self.conn_timeout_ms))
    }
}

/// Current `method -> timeout` table, swapped wholesale on every change.
#[derive(Debug, Default)]
pub struct RpcTimeoutContainer {
    configs: ArcSwap<HashMap<String, RpcTimeout>>,
}

impl RpcTimeoutContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_policy_change(
        &self,
        configs: HashMap<String, RpcTimeout>,
    ) {
        self.configs.store(Arc::new(configs));
    }

    pub fn snapshot(&self) -> Arc<HashMap<String, RpcTimeout>> {
        self.configs.load_full()
    }

    pub fn callback(
        self: &Arc<Self>,
        key: &str,
        kind: ValueFormat,
    ) -> ConfigCallback {
        let container = self.clone();
        let key = key.to_string();
        Arc::new(move |data: &str, parser: &dyn ConfigParser| {
            if let Some(configs) =
                decode_or_skip::<HashMap<String, RpcTimeout>>(parser, kind, data, &key, RPC_TIMEOUT_CATEGORY)
            {
                container.notify_policy_change(configs);
                record_update(RPC_TIMEOUT_CATEGORY);
            }
        })
    }
}

impl TimeoutProvider for RpcTimeoutContainer {
    fn timeouts(
        &self,
        method: &str,
    ) -> Option<RpcTimeout> {
        let configs = self.configs.load();
        configs
            .get(method)
            .or_else(|| configs.get(WILDCARD_METHOD))
            .copied()
    }
}
