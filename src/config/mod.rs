//! Settings for the configuration-center adapter.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod consul;
mod services;
mod watch;
pub use consul::*;
pub use services::*;
pub use watch::*;

#[cfg(test)]
mod config_test;

use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Main settings container
///
/// Merge order (later sources override earlier):
/// 1. Default values from code
/// 2. Optional `config/default.toml`
/// 3. Configuration file specified by `CONFIG_PATH`
/// 4. Environment variables prefixed with `POLICY__`
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Consul connection and key layout
    #[serde(default)]
    pub consul: ConsulConfig,
    /// Watch subscription tuning
    #[serde(default)]
    pub watch: WatchConfig,
    /// Services the binary wires suites for
    #[serde(default)]
    pub services: ServicesConfig,
}

impl Debug for Settings {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("consul", &self.consul)
            .field("watch", &self.watch)
            .field("services", &self.services)
            .finish()
    }
}

impl Settings {
    /// Loads settings from hierarchical sources without validation.
    ///
    /// Callers MUST call `validate()` before using the settings.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/policy.toml");
    /// std::env::set_var("POLICY__CONSUL__ADDRESS", "10.0.0.3:8500");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config/default").required(false));

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current values
    /// 2. New configuration file
    /// 3. Latest environment variables
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.consul.validate()?;
        self.watch.validate()?;
        self.services.validate()?;
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix("POLICY")
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("services.dest_services")
    }
}
