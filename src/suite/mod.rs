//! Per-service wiring of watches to policy containers.
//!
//! A client suite watches the retry, RPC timeout, circuit-breaker and
//! degradation keys of one `(client, server)` pair. A server suite watches the
//! limiter key of one service. Both hand back the containers the RPC framework
//! reads, plus the teardown that deregisters their watches.

mod client_suite;
mod options;
mod server_suite;

pub use client_suite::*;
pub use options::*;
pub use server_suite::*;

#[cfg(test)]
mod client_suite_test;
