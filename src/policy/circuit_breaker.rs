use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use serde::Serialize;

use super::decode_or_skip;
use crate::constants::CIRCUIT_BREAK_CATEGORY;
use crate::metrics::record_update;
use crate::ConfigCallback;
use crate::ConfigParser;
use crate::ValueFormat;

/// Circuit-breaker settings of one service pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbConfig {
    pub enable: bool,
    #[serde(alias = "errRate")]
    pub err_rate: f64,
    #[serde(alias = "minSample")]
    pub min_sample: i64,
}

impl Default for CbConfig {
    fn default() -> Self {
        Self {
            enable: false,
            err_rate: 0.5,
            min_sample: 200,
        }
    }
}

#[derive(Debug, Default)]
pub struct CircuitBreakerContainer {
    config: ArcSwap<CbConfig>,
}

impl CircuitBreakerContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify_policy_change(
        &self,
        config: CbConfig,
    ) {
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<CbConfig> {
        self.config.load_full()
    }

    pub fn callback(
        self: &Arc<Self>,
        key: &str,
        kind: ValueFormat,
    ) -> ConfigCallback {
        let container = self.clone();
        let key = key.to_string();
        Arc::new(move |data: &str, parser: &dyn ConfigParser| {
            if let Some(config) = decode_or_skip::<CbConfig>(parser, kind, data, &key, CIRCUIT_BREAK_CATEGORY) {
                container.notify_policy_change(config);
                record_update(CIRCUIT_BREAK_CATEGORY);
            }
        })
    }
}
