use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Services the `policy-watch` binary builds suites for
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServicesConfig {
    /// Local identity used as `clientServiceName` in client keys
    #[serde(default)]
    pub client_service: String,

    /// Service whose limiter policy is watched (empty to skip)
    #[serde(default)]
    pub server_service: String,

    /// Destination services whose client policies are watched
    #[serde(default)]
    pub dest_services: Vec<String>,
}

impl ServicesConfig {
    /// Client keys embed `client_service`, so it must be set whenever client
    /// suites are built.
    pub fn validate(&self) -> Result<()> {
        if !self.dest_services.is_empty() && self.client_service.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "services.client_service cannot be empty when services.dest_services is set".into(),
            ));
        }
        if self.dest_services.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::InvalidConfig("services.dest_services cannot contain empty names".into()));
        }
        Ok(())
    }
}
