use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::constants::LIMIT_CATEGORY;
use crate::ConfigClient;
use crate::ConfigParamConfig;
use crate::LimiterContainer;
use crate::Result;
use crate::SuiteOptions;

/// Server-side policies of one service
#[derive(Debug)]
pub struct ServerSuite {
    service: String,
    client: ConfigClient,
    options: SuiteOptions,
    subscriber_id: i64,
}

impl ServerSuite {
    pub fn new(
        service: impl Into<String>,
        client: ConfigClient,
        options: SuiteOptions,
    ) -> Self {
        let subscriber_id = client.allocate_unique_id();
        Self {
            service: service.into(),
            client,
            options,
            subscriber_id,
        }
    }

    pub fn subscriber_id(&self) -> i64 {
        self.subscriber_id
    }

    /// Registers the limiter watch.
    ///
    /// The returned limiter is unbound; the server attaches its updater with
    /// [`LimiterContainer::update_control`] once it is running.
    ///
    /// # Errors
    /// - [`crate::KeyError`] when the limiter key cannot be resolved
    pub async fn build(&self) -> Result<ServerPolicies> {
        let param = ConfigParamConfig {
            category: LIMIT_CATEGORY.to_string(),
            server_service_name: self.service.clone(),
            ..Default::default()
        };
        let key = self
            .client
            .server_config_param(&param, &self.options.custom_functions)?;
        let store_key = key.store_key();

        let limiter = Arc::new(LimiterContainer::new(store_key.clone()));
        debug!(key = %store_key, subscriber_id = self.subscriber_id, "registering limiter watch");
        self.client
            .register_config_callback(&store_key, self.subscriber_id, limiter.callback(key.value_format))
            .await;
        info!(service = %self.service, subscriber_id = self.subscriber_id, "server suite ready");

        Ok(ServerPolicies {
            limiter,
            key: store_key,
            subscriber_id: self.subscriber_id,
            client: self.client.clone(),
        })
    }
}

/// Containers of one server suite
#[derive(Debug)]
pub struct ServerPolicies {
    pub limiter: Arc<LimiterContainer>,
    key: String,
    subscriber_id: i64,
    client: ConfigClient,
}

impl ServerPolicies {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn subscriber_id(&self) -> i64 {
        self.subscriber_id
    }

    /// Shutdown hook: deregisters the limiter watch.
    pub fn shutdown(&self) {
        self.client.deregister_config(&self.key, self.subscriber_id);
        debug!(key = %self.key, subscriber_id = self.subscriber_id, "server suite shut down");
    }
}
