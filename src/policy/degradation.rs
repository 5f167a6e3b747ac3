use std::sync::Arc;

use arc_swap::ArcSwap;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use super::decode_or_skip;
use crate::constants::DEGRADATION_CATEGORY;
use crate::metrics::record_update;
use crate::AclRejection;
use crate::AclRule;
use crate::ConfigCallback;
use crate::ConfigParser;
use crate::ValueFormat;

/// Share of requests dropped on the client side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    pub enable: bool,
    /// 0..=100
    pub percentage: u32,
}

#[derive(Debug, Default)]
pub struct DegradationContainer {
    config: ArcSwap<DegradationConfig>,
}

impl DegradationContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_policy_change(
        &self,
        config: DegradationConfig,
    ) {
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> DegradationConfig {
        **self.config.load()
    }

    /// Whether a request with the given roll in `0..100` is dropped
    pub(super) fn drops(
        config: &DegradationConfig,
        roll: u32,
    ) -> bool {
        config.enable && roll < config.percentage
    }

    pub fn callback(
        self: &Arc<Self>,
        key: &str,
        kind: ValueFormat,
    ) -> ConfigCallback {
        let container = self.clone();
        let key = key.to_string();
        Arc::new(move |data: &str, parser: &dyn ConfigParser| {
            if let Some(config) = decode_or_skip::<DegradationConfig>(parser, kind, data, &key, DEGRADATION_CATEGORY)
            {
                container.notify_policy_change(config);
                record_update(DEGRADATION_CATEGORY);
            }
        })
    }
}

impl AclRule for DegradationContainer {
    fn check(
        &self,
        method: &str,
    ) -> Result<(), AclRejection> {
        let config = self.config();
        if !config.enable {
            return Ok(());
        }
        let roll = rand::thread_rng().gen_range(0..100);
        if Self::drops(&config, roll) {
            trace!(method, roll, percentage = config.percentage, "request degraded");
            return Err(AclRejection {
                method: method.to_string(),
                rule: "degradation",
            });
        }
        Ok(())
    }
}

