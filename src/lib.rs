//! Dynamic RPC governance policy from a key-value configuration center.
//!
//! Services fetch retry, timeout, circuit-breaker, rate-limit and degradation
//! policy from Consul and apply changes at runtime:
//!
//! - [`ConfigClient`] resolves store keys and owns the watch subscriptions
//! - [`ClientSuite`] / [`ServerSuite`] wire one service's watches to policy
//!   containers
//! - the containers in [`policy`] are what the RPC framework reads per call,
//!   through the traits in [`hooks`]

mod client;
mod config;
pub mod constants;
mod errors;
pub mod hooks;
mod key;
pub mod metrics;
mod parser;
pub mod policy;
mod store;
mod suite;
pub mod utils;
mod watch;

pub use client::*;
pub use config::*;
pub use errors::*;
pub use hooks::*;
pub use key::*;
pub use parser::*;
pub use policy::*;
pub use store::*;
pub use suite::*;
pub use utils::*;
pub use watch::*;
