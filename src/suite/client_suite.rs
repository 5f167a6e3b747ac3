use std::sync::Arc;

use tracing::debug;
use tracing::info;

use crate::constants::CIRCUIT_BREAK_CATEGORY;
use crate::constants::DEGRADATION_CATEGORY;
use crate::constants::RETRY_CATEGORY;
use crate::constants::RPC_TIMEOUT_CATEGORY;
use crate::CircuitBreakerContainer;
use crate::ConfigClient;
use crate::ConfigParamConfig;
use crate::DegradationContainer;
use crate::Key;
use crate::Result;
use crate::RetryContainer;
use crate::RpcTimeoutContainer;
use crate::SuiteOptions;

/// Client-side policies for calls from `src` to `dest`
#[derive(Debug)]
pub struct ClientSuite {
    dest: String,
    src: String,
    client: ConfigClient,
    options: SuiteOptions,
    subscriber_id: i64,
}

impl ClientSuite {
    /// Allocates the subscriber id all of this suite's watches share.
    pub fn new(
        dest: impl Into<String>,
        src: impl Into<String>,
        client: ConfigClient,
        options: SuiteOptions,
    ) -> Self {
        let subscriber_id = client.allocate_unique_id();
        Self {
            dest: dest.into(),
            src: src.into(),
            client,
            options,
            subscriber_id,
        }
    }

    pub fn subscriber_id(&self) -> i64 {
        self.subscriber_id
    }

    fn resolve(
        &self,
        category: &str,
    ) -> Result<Key> {
        let param = ConfigParamConfig {
            category: category.to_string(),
            client_service_name: self.src.clone(),
            server_service_name: self.dest.clone(),
        };
        self.client
            .client_config_param(&param, &self.options.custom_functions)
    }

    /// Registers every client-side watch and returns the live containers.
    ///
    /// Stored values are already applied when this returns.
    ///
    /// # Errors
    /// - [`crate::KeyError`] when a key cannot be resolved; nothing is
    ///   registered in that case
    pub async fn build(&self) -> Result<ClientPolicies> {
        let retry_key = self.resolve(RETRY_CATEGORY)?;
        let timeout_key = self.resolve(RPC_TIMEOUT_CATEGORY)?;
        let cb_key = self.resolve(CIRCUIT_BREAK_CATEGORY)?;
        let degradation_key = self.resolve(DEGRADATION_CATEGORY)?;

        let retry = Arc::new(RetryContainer::new());
        let rpc_timeout = Arc::new(RpcTimeoutContainer::new());
        let circuit_breaker = Arc::new(CircuitBreakerContainer::new());
        let degradation = Arc::new(DegradationContainer::new());

        let registrations = [
            (
                retry_key.store_key(),
                retry.callback(&retry_key.store_key(), retry_key.value_format, &self.dest),
            ),
            (
                timeout_key.store_key(),
                rpc_timeout.callback(&timeout_key.store_key(), timeout_key.value_format),
            ),
            (
                cb_key.store_key(),
                circuit_breaker.callback(&cb_key.store_key(), cb_key.value_format),
            ),
            (
                degradation_key.store_key(),
                degradation.callback(&degradation_key.store_key(), degradation_key.value_format),
            ),
        ];

        let mut keys = Vec::with_capacity(registrations.len());
        for (key, callback) in registrations {
            debug!(key = %key, subscriber_id = self.subscriber_id, "registering client policy watch");
            self.client
                .register_config_callback(&key, self.subscriber_id, callback)
                .await;
            keys.push(key);
        }
        info!(dest = %self.dest, src = %self.src, subscriber_id = self.subscriber_id, "client suite ready");

        Ok(ClientPolicies {
            retry,
            rpc_timeout,
            circuit_breaker,
            degradation,
            keys,
            subscriber_id: self.subscriber_id,
            client: self.client.clone(),
        })
    }
}

/// Containers of one client suite
#[derive(Debug)]
pub struct ClientPolicies {
    pub retry: Arc<RetryContainer>,
    pub rpc_timeout: Arc<RpcTimeoutContainer>,
    pub circuit_breaker: Arc<CircuitBreakerContainer>,
    pub degradation: Arc<DegradationContainer>,
    keys: Vec<String>,
    subscriber_id: i64,
    client: ConfigClient,
}

impl ClientPolicies {
    /// Store keys this suite watches
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn subscriber_id(&self) -> i64 {
        self.subscriber_id
    }

    /// Deregisters every watch of the suite and clears the retry policies.
    ///
    /// Meant to be called from the RPC client's close callback. Calling it
    /// again is harmless.
    pub fn close(&self) {
        for key in &self.keys {
            self.client.deregister_config(key, self.subscriber_id);
        }
        self.retry.close();
        debug!(subscriber_id = self.subscriber_id, "client suite closed");
    }
}
