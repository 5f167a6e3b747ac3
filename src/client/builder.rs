use std::sync::Arc;

use super::ConfigClient;
use crate::ConfigParser;
use crate::ConfigStore;
use crate::ConsulConfig;
use crate::ConsulStore;
use crate::Result;
use crate::Settings;
use crate::WatchConfig;

pub struct ConfigClientBuilder {
    settings: Settings,
    store: Option<Arc<dyn ConfigStore>>,
    parser: Option<Arc<dyn ConfigParser>>,
}

impl ConfigClientBuilder {
    /// Create a new builder over already loaded settings
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            store: None,
            parser: None,
        }
    }

    /// Replaces the Consul section of the settings
    pub fn consul(
        mut self,
        consul: ConsulConfig,
    ) -> Self {
        self.settings.consul = consul;
        self
    }

    /// Replaces the watch tuning section of the settings
    pub fn watch(
        mut self,
        watch: WatchConfig,
    ) -> Self {
        self.settings.watch = watch;
        self
    }

    /// Use `store` instead of connecting to Consul
    pub fn store(
        mut self,
        store: Arc<dyn ConfigStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    /// Parser handed to callbacks (default: [`crate::DefaultParser`])
    pub fn parser(
        mut self,
        parser: Arc<dyn ConfigParser>,
    ) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Validates the settings and creates the client.
    ///
    /// # Errors
    /// - [`crate::Error::InvalidConfig`] when the settings do not validate
    /// - [`crate::StoreError::ClientBuild`] when the Consul HTTP client cannot
    ///   be created
    pub fn build(self) -> Result<ConfigClient> {
        let settings = self.settings.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(ConsulStore::new(&settings.consul, &settings.watch)?),
        };

        let client = ConfigClient::new(store, &settings.consul, &settings.watch);
        if let Some(parser) = self.parser {
            client.set_parser(parser);
        }
        Ok(client)
    }
}
