//! Store key resolution.
//!
//! A [`Key`] is rendered from three templates (prefix, server path, client
//! path) against a [`ConfigParamConfig`]. The store key is
//! `prefix + "/" + path`. Customization functions run after rendering and may
//! rewrite any field.

mod template;


use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::ConsulConfig;
use crate::ParseError;
use crate::Result;

/// Encoding of a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    #[default]
    Json,
    Yaml,
    Hcl,
}

impl ValueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueFormat::Json => "json",
            ValueFormat::Yaml => "yaml",
            ValueFormat::Hcl => "hcl",
        }
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ValueFormat::Json),
            "yaml" | "yml" => Ok(ValueFormat::Yaml),
            "hcl" => Ok(ValueFormat::Hcl),
            _ => Err(ParseError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Parameters the key templates are rendered against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigParamConfig {
    pub category: String,
    pub client_service_name: String,
    pub server_service_name: String,
}

/// A resolved store key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub value_format: ValueFormat,
    pub prefix: String,
    pub path: String,
}

impl Key {
    /// Full key as addressed in the store
    pub fn store_key(&self) -> String {
        format!("{}/{}", self.prefix, self.path)
    }
}

/// Hook applied to a resolved key, in registration order
pub type CustomFunction = Arc<dyn Fn(&mut Key) + Send + Sync>;

/// Which path template a key is rendered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Server,
    Client,
}

/// Renders keys from the configured templates. Pure apart from the caller's
/// customization functions.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    value_format: ValueFormat,
    prefix_template: String,
    server_path_template: String,
    client_path_template: String,
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new(&ConsulConfig::default())
    }
}

impl KeyResolver {
    pub fn new(config: &ConsulConfig) -> Self {
        Self {
            value_format: config.config_type,
            prefix_template: config.prefix_template.clone(),
            server_path_template: config.server_path_template.clone(),
            client_path_template: config.client_path_template.clone(),
        }
    }

    pub fn value_format(&self) -> ValueFormat {
        self.value_format
    }

    /// Renders prefix and path for `param`, then applies `custom_functions`.
    ///
    /// # Errors
    /// - [`crate::KeyError`] when a template is malformed or names an unknown field
    pub fn resolve(
        &self,
        param: &ConfigParamConfig,
        kind: TemplateKind,
        custom_functions: &[CustomFunction],
    ) -> Result<Key> {
        let path_template = match kind {
            TemplateKind::Server => &self.server_path_template,
            TemplateKind::Client => &self.client_path_template,
        };

        let mut key = Key {
            value_format: self.value_format,
            prefix: template::render(&self.prefix_template, param)?,
            path: template::render(path_template, param)?,
        };

        for f in custom_functions {
            f(&mut key);
        }
        Ok(key)
    }

    pub fn server_config_param(
        &self,
        param: &ConfigParamConfig,
        custom_functions: &[CustomFunction],
    ) -> Result<Key> {
        self.resolve(param, TemplateKind::Server, custom_functions)
    }

    pub fn client_config_param(
        &self,
        param: &ConfigParamConfig,
        custom_functions: &[CustomFunction],
    ) -> Result<Key> {
        self.resolve(param, TemplateKind::Client, custom_functions)
    }
}
