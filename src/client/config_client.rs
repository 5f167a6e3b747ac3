use std::sync::Arc;

use super::ConfigClientBuilder;
use crate::ConfigCallback;
use crate::ConfigParamConfig;
use crate::ConfigParser;
use crate::ConfigStore;
use crate::ConsulConfig;
use crate::CustomFunction;
use crate::Key;
use crate::KeyResolver;
use crate::Result;
use crate::Settings;
use crate::SubscriptionManager;
use crate::UniqueIdAllocator;
use crate::ValueFormat;
use crate::WatchConfig;

/// Handle to the configuration center
///
/// Cheap to clone; clones share subscriptions and the id allocator.
/// Created through [`builder()`](ConfigClient::builder) or
/// [`new()`](ConfigClient::new) with an explicit store.
#[derive(Clone, Debug)]
pub struct ConfigClient {
    pub(super) inner: Arc<ClientInner>,
}

#[derive(Debug)]
pub struct ClientInner {
    pub(super) resolver: KeyResolver,
    pub(super) manager: SubscriptionManager,
    pub(super) ids: UniqueIdAllocator,
}

impl ConfigClient {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        consul: &ConsulConfig,
        watch: &WatchConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                resolver: KeyResolver::new(consul),
                manager: SubscriptionManager::new(store, watch),
                ids: UniqueIdAllocator::new(),
            }),
        }
    }

    /// Starts building a client from loaded settings
    pub fn builder(settings: Settings) -> ConfigClientBuilder {
        ConfigClientBuilder::new(settings)
    }

    /// Replaces the parser handed to every callback, running watches included.
    pub fn set_parser(
        &self,
        parser: Arc<dyn ConfigParser>,
    ) {
        self.inner.manager.set_parser(parser);
    }

    pub fn parser(&self) -> Arc<dyn ConfigParser> {
        self.inner.manager.parser()
    }

    /// Format stored values are encoded in
    pub fn value_format(&self) -> ValueFormat {
        self.inner.resolver.value_format()
    }

    /// Resolves the key of a server-side policy.
    ///
    /// # Errors
    /// - [`crate::KeyError`] when a template cannot be rendered for `param`
    pub fn server_config_param(
        &self,
        param: &ConfigParamConfig,
        custom_functions: &[CustomFunction],
    ) -> Result<Key> {
        self.inner.resolver.server_config_param(param, custom_functions)
    }

    /// Resolves the key of a client-side policy.
    ///
    /// # Errors
    /// - [`crate::KeyError`] when a template cannot be rendered for `param`
    pub fn client_config_param(
        &self,
        param: &ConfigParamConfig,
        custom_functions: &[CustomFunction],
    ) -> Result<Key> {
        self.inner.resolver.client_config_param(param, custom_functions)
    }

    /// See [`SubscriptionManager::register_config_callback`].
    pub async fn register_config_callback(
        &self,
        key: &str,
        subscriber_id: i64,
        callback: ConfigCallback,
    ) {
        self.inner
            .manager
            .register_config_callback(key, subscriber_id, callback)
            .await;
    }

    pub fn deregister_config(
        &self,
        key: &str,
        subscriber_id: i64,
    ) {
        self.inner.manager.deregister_config(key, subscriber_id);
    }

    /// Next subscriber id; ids are never reused by this client.
    pub fn allocate_unique_id(&self) -> i64 {
        self.inner.ids.allocate()
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.manager.subscription_count()
    }

    pub fn is_registered(
        &self,
        key: &str,
        subscriber_id: i64,
    ) -> bool {
        self.inner.manager.is_registered(key, subscriber_id)
    }

    /// Cancels every watch registered through this client and its clones.
    pub fn shutdown(&self) {
        self.inner.manager.shutdown();
    }
}
