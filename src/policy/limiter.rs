use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::decode_or_skip;
use crate::constants::LIMIT_CATEGORY;
use crate::metrics::record_update;
use crate::ConfigCallback;
use crate::ConfigParser;
use crate::LimitUpdater;
use crate::ValueFormat;

/// Limits as stored in the config center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    #[serde(alias = "connectionLimit")]
    pub connection_limit: i64,
    #[serde(alias = "qpsLimit", alias = "QPSLimit")]
    pub qps_limit: i64,
}

/// Limits handed to the server's limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitOption {
    pub max_connections: i64,
    pub max_qps: i64,
}

impl From<LimiterConfig> for LimitOption {
    fn from(config: LimiterConfig) -> Self {
        Self {
            max_connections: config.connection_limit,
            max_qps: config.qps_limit,
        }
    }
}

#[derive(Default)]
struct LimiterState {
    option: LimitOption,
    updater: Option<Arc<dyn LimitUpdater>>,
    /// A policy arrived since creation
    received: bool,
}

/// Server-side connection and QPS limits.
///
/// Starts unbound: policies received before the server attaches its updater
/// are kept, and the last one is applied by [`update_control`].
///
/// [`update_control`]: LimiterContainer::update_control
pub struct LimiterContainer {
    key: String,
    state: Mutex<LimiterState>,
}

impl std::fmt::Debug for LimiterContainer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LimiterContainer")
            .field("key", &self.key)
            .field("option", &state.option)
            .field("bound", &state.updater.is_some())
            .finish()
    }
}

impl LimiterContainer {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Binds the server's updater and flushes the last received policy to it.
    ///
    /// The updater is called without the container lock held, so it may read
    /// the container back.
    pub fn update_control(
        &self,
        updater: Arc<dyn LimitUpdater>,
    ) {
        let (option, received) = {
            let mut state = self.state.lock();
            state.updater = Some(updater.clone());
            (state.option, state.received)
        };
        debug!("[consul] {} server consul limiter updater init, config {:?}", self.key, option);
        if received {
            self.apply(updater.as_ref(), &option);
        }
    }

    pub fn notify_policy_change(
        &self,
        config: LimiterConfig,
    ) {
        let (option, updater) = {
            let mut state = self.state.lock();
            state.option = config.into();
            state.received = true;
            (state.option, state.updater.clone())
        };

        let Some(updater) = updater else {
            warn!("[consul] {} server consul limiter config failed as the updater is empty", self.key);
            return;
        };
        self.apply(updater.as_ref(), &option);
    }

    fn apply(
        &self,
        updater: &dyn LimitUpdater,
        option: &LimitOption,
    ) {
        if !updater.update_limit(option) {
            warn!(
                "[consul] {} server consul limiter config: {:?} may not take effect",
                self.key, option
            );
        }
    }

    pub fn current(&self) -> LimitOption {
        self.state.lock().option
    }

    pub fn is_bound(&self) -> bool {
        self.state.lock().updater.is_some()
    }

    pub fn callback(
        self: &Arc<Self>,
        kind: ValueFormat,
    ) -> ConfigCallback {
        let container = self.clone();
        Arc::new(move |data: &str, parser: &dyn ConfigParser| {
            if let Some(config) = decode_or_skip::<LimiterConfig>(parser, kind, data, &container.key, LIMIT_CATEGORY) {
                container.notify_policy_change(config);
                record_update(LIMIT_CATEGORY);
            }
        })
    }
}
