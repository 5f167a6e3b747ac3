//! Policy containers read on the request path.
//!
//! Each container keeps the last successfully decoded policy for one category
//! and exposes one mutation entry point. [`callback`](RetryContainer::callback)
//! builders turn a container into the [`crate::ConfigCallback`] registered with
//! the watch manager: decode, validate, apply. A payload that fails to decode
//! is logged and skipped, leaving the container as it was.

mod circuit_breaker;
mod degradation;
mod limiter;
mod retry;
mod timeout;

pub use circuit_breaker::*;
pub use degradation::*;
pub use limiter::*;
pub use retry::*;
pub use timeout::*;


use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;

use crate::metrics::record_decode_failure;
use crate::ConfigParser;
use crate::ValueFormat;

/// Decodes one payload for `category`, or logs why it was skipped.
pub(crate) fn decode_or_skip<T: DeserializeOwned>(
    parser: &dyn ConfigParser,
    kind: ValueFormat,
    data: &str,
    key: &str,
    category: &str,
) -> Option<T> {
    let value = match parser.decode_value(kind, data) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(key, category, format = %kind, "payload format is not decoded, skip...");
            return None;
        }
        Err(e) => {
            warn!(key, category, "[consul] unmarshal data {} failed: {}, skip...", data, e);
            record_decode_failure(category);
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(key, category, "[consul] unmarshal data {} failed: {}, skip...", data, e);
            record_decode_failure(category);
            None
        }
    }
}
