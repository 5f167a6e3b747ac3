use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONSUL_DEFAULT_ADDRESS;
use crate::constants::CONSUL_DEFAULT_DATACENTER;
use crate::constants::CONSUL_DEFAULT_TIMEOUT_MS;
use crate::constants::DEFAULT_CLIENT_PATH_TEMPLATE;
use crate::constants::DEFAULT_PREFIX_TEMPLATE;
use crate::constants::DEFAULT_SERVER_PATH_TEMPLATE;
use crate::Error;
use crate::Result;
use crate::ValueFormat;

/// Consul connection parameters and key layout templates
#[derive(Serialize, Deserialize, Clone)]
pub struct ConsulConfig {
    /// Agent address, `host:port` or a full `http(s)://` URL
    /// Default: "127.0.0.1:8500"
    #[serde(default = "default_address")]
    pub address: String,

    /// Datacenter queried for keys
    /// Default: "dc1"
    #[serde(default = "default_datacenter")]
    pub datacenter: String,

    /// ACL token sent as `X-Consul-Token`
    /// Default: empty (anonymous)
    #[serde(default)]
    pub token: String,

    /// Per-request timeout for point reads in milliseconds
    /// Default: 5000
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Template for the key prefix
    /// Default: "KitexConfig"
    #[serde(default = "default_prefix_template")]
    pub prefix_template: String,

    /// Template for server-side key paths
    /// Default: "{serverServiceName}/{category}"
    #[serde(default = "default_server_path_template")]
    pub server_path_template: String,

    /// Template for client-side key paths
    /// Default: "{clientServiceName}/{serverServiceName}/{category}"
    #[serde(default = "default_client_path_template")]
    pub client_path_template: String,

    /// Encoding of stored values
    /// Default: json
    #[serde(default)]
    pub config_type: ValueFormat,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            datacenter: default_datacenter(),
            token: String::new(),
            timeout_ms: default_timeout_ms(),
            prefix_template: default_prefix_template(),
            server_path_template: default_server_path_template(),
            client_path_template: default_client_path_template(),
            config_type: ValueFormat::default(),
        }
    }
}

impl std::fmt::Debug for ConsulConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConsulConfig")
            .field("address", &self.address)
            .field("datacenter", &self.datacenter)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("timeout_ms", &self.timeout_ms)
            .field("prefix_template", &self.prefix_template)
            .field("server_path_template", &self.server_path_template)
            .field("client_path_template", &self.client_path_template)
            .field("config_type", &self.config_type)
            .finish()
    }
}

impl ConsulConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidConfig("consul.address cannot be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("consul.timeout_ms must be greater than 0".into()));
        }
        for (name, template) in [
            ("consul.prefix_template", &self.prefix_template),
            ("consul.server_path_template", &self.server_path_template),
            ("consul.client_path_template", &self.client_path_template),
        ] {
            if template.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL with scheme, without trailing slash
    pub fn base_url(&self) -> String {
        let address = self.address.trim().trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }
}

fn default_address() -> String {
    CONSUL_DEFAULT_ADDRESS.into()
}
fn default_datacenter() -> String {
    CONSUL_DEFAULT_DATACENTER.into()
}
fn default_timeout_ms() -> u64 {
    CONSUL_DEFAULT_TIMEOUT_MS
}
fn default_prefix_template() -> String {
    DEFAULT_PREFIX_TEMPLATE.into()
}
fn default_server_path_template() -> String {
    DEFAULT_SERVER_PATH_TEMPLATE.into()
}
fn default_client_path_template() -> String {
    DEFAULT_CLIENT_PATH_TEMPLATE.into()
}
