//! Configuration Center Error Hierarchy
//!
//! Errors are grouped by the layer that produces them. Only setup-time
//! failures (key rendering, store construction, settings) ever reach a caller;
//! everything raised on the watch path is logged and swallowed.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key template rendering failures
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Payload decoding failures
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Store client construction and I/O failures
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Settings loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings that loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Placeholder names a field that `ConfigParamConfig` does not carry
    #[error("Unknown placeholder `{placeholder}` in template `{template}`")]
    UnknownPlaceholder { template: String, placeholder: String },

    /// Opening or closing brace without its pair
    #[error("Unbalanced braces in template `{0}`")]
    UnbalancedBraces(String),

    /// Template rendered to nothing
    #[error("Template `{0}` rendered to an empty string")]
    EmptyRender(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported config data type {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Client could not be built from the supplied options
    #[error("Failed to build store client: {0}")]
    ClientBuild(String),

    /// Point read exceeded its deadline
    #[error("Read of `{key}` timed out after {duration:?}")]
    Timeout { key: String, duration: Duration },

    /// Watch could not be set up for the key
    #[error("Invalid watch parameters for `{key}`: {reason}")]
    InvalidWatch { key: String, reason: String },

    /// Unexpected HTTP status from the store
    #[error("Store returned status {status} for `{key}`")]
    UnexpectedStatus { key: String, status: u16 },

    /// Transport level failures
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Stored bytes were not valid UTF-8
    #[error("Value of `{0}` is not valid UTF-8")]
    InvalidUtf8(String),
}
