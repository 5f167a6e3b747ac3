//! Configuration-center client.
//!
//! [`ConfigClient`] is the entry point suites talk to. It bundles:
//! - key resolution from the configured templates
//! - the watch subscription manager over a [`crate::ConfigStore`]
//! - the subscriber id allocator
//!
//! # Basic Usage
//! ```no_run
//! use rpc_config_center::ConfigClient;
//! use rpc_config_center::Settings;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> rpc_config_center::Result<()> {
//!     let client = ConfigClient::builder(Settings::new()?).build()?;
//!     let id = client.allocate_unique_id();
//!     client
//!         .register_config_callback("KitexConfig/frontend/echo/retry", id, std::sync::Arc::new(|data, _parser| {
//!             println!("retry policy: {}", data);
//!         }))
//!         .await;
//!     Ok(())
//! }
//! ```

mod builder;
mod config_client;

pub use builder::*;
pub use config_client::*;

#[cfg(test)]
mod config_client_test;
