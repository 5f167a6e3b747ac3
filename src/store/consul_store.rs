//! Consul KV backend.
//!
//! Point reads use `GET /v1/kv/<key>?raw`. Watches are Consul blocking queries:
//! each request carries the last seen `X-Consul-Index` and parks on the server
//! until the key changes or `wait` elapses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use reqwest::StatusCode;
use tracing::debug;
use tracing::trace;

use super::ConfigStore;
use super::StoreEvent;
use super::WatchStream;
use crate::constants::CONSUL_INDEX_HEADER;
use crate::constants::CONSUL_TOKEN_HEADER;
use crate::ConsulConfig;
use crate::Result;
use crate::StoreError;
use crate::WatchConfig;

/// One KV read: the value (if any) and the index it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KvRead {
    pub(crate) value: Option<String>,
    pub(crate) index: u64,
}

#[derive(Debug)]
pub(super) struct ConsulInner {
    http: reqwest::Client,
    base_url: String,
    datacenter: String,
    token: String,
    timeout: Duration,
    wait_time: Duration,
    retry_base_delay: Duration,
    retry_max_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ConsulStore {
    pub(super) inner: Arc<ConsulInner>,
}

impl ConsulStore {
    /// # Errors
    /// - [`crate::StoreError::ClientBuild`] when the HTTP client cannot be built
    pub fn new(
        consul: &ConsulConfig,
        watch: &WatchConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(consul.timeout())
            .build()
            .map_err(|e| StoreError::ClientBuild(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(ConsulInner {
                http,
                base_url: consul.base_url(),
                datacenter: consul.datacenter.clone(),
                token: consul.token.clone(),
                timeout: consul.timeout(),
                wait_time: watch.wait_time(),
                retry_base_delay: watch.retry_base_delay(),
                retry_max_delay: watch.retry_max_delay(),
            }),
        })
    }
}

impl ConsulInner {
    pub(super) fn kv_url(
        &self,
        key: &str,
    ) -> String {
        format!("{}/v1/kv/{}", self.base_url, key.trim_start_matches('/'))
    }

    pub(super) fn query_params(
        &self,
        index: Option<u64>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![("raw", "true".to_string())];
        if !self.datacenter.is_empty() {
            params.push(("dc", self.datacenter.clone()));
        }
        if let Some(index) = index {
            params.push(("index", index.to_string()));
            params.push(("wait", format!("{}s", self.wait_time.as_secs().max(1))));
        }
        params
    }

    /// Consul adds up to `wait / 16` of jitter to a blocking query.
    fn blocking_timeout(&self) -> Duration {
        self.wait_time + self.wait_time / 16 + self.timeout
    }

    async fn read(
        &self,
        key: &str,
        index: Option<u64>,
        timeout: Duration,
    ) -> std::result::Result<KvRead, StoreError> {
        let mut request = self
            .http
            .get(self.kv_url(key))
            .query(&self.query_params(index))
            .timeout(timeout);
        if !self.token.is_empty() {
            request = request.header(CONSUL_TOKEN_HEADER, &self.token);
        }

        let response = request.send().await?;
        let index = response
            .headers()
            .get(CONSUL_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|_| StoreError::InvalidUtf8(key.to_string()))?;
                Ok(KvRead {
                    value: Some(value),
                    index,
                })
            }
            StatusCode::NOT_FOUND => Ok(KvRead { value: None, index }),
            status => Err(StoreError::UnexpectedStatus {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

/// Index to send with the next blocking query.
///
/// An index that goes backwards means the store was restored or the key was
/// recreated, so the watch restarts from zero. A missing index is sent as 1
/// so the next query still blocks.
pub(crate) fn next_index(
    previous: u64,
    returned: u64,
) -> u64 {
    if returned == 0 {
        1
    } else if returned < previous {
        0
    } else {
        returned
    }
}

/// Exponential backoff, capped at `max`
pub(crate) fn next_backoff(
    current: Duration,
    max: Duration,
) -> Duration {
    std::cmp::min(current.saturating_mul(2), max)
}

/// Event to emit for a read, or `None` when nothing observable changed.
pub(crate) fn change_event(
    last: &Option<Option<String>>,
    read: &KvRead,
) -> Option<StoreEvent> {
    match (last, &read.value) {
        (Some(prev), current) if prev == current => None,
        // first read of a missing key: nothing was there to delete
        (None, None) => None,
        (_, Some(value)) => Some(StoreEvent::Put(value.clone())),
        (Some(_), None) => Some(StoreEvent::Delete),
    }
}

struct WatchState {
    inner: Arc<ConsulInner>,
    key: String,
    index: u64,
    last: Option<Option<String>>,
    backoff: Duration,
    pending_delay: Option<Duration>,
}

#[async_trait]
impl ConfigStore for ConsulStore {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let read = self.inner.read(key, None, self.inner.timeout).await?;
        trace!(key, index = read.index, "consul point read");
        Ok(read.value)
    }

    async fn watch(
        &self,
        key: &str,
    ) -> Result<WatchStream> {
        let key = key.trim_start_matches('/');
        if key.is_empty() || key.contains("//") {
            return Err(StoreError::InvalidWatch {
                key: key.to_string(),
                reason: "key must be a non-empty path without empty segments".into(),
            }
            .into());
        }

        let state = WatchState {
            inner: self.inner.clone(),
            key: key.to_string(),
            index: 0,
            last: None,
            backoff: self.inner.retry_base_delay,
            pending_delay: None,
        };

        let stream = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(delay) = state.pending_delay.take() {
                    tokio::time::sleep(delay).await;
                }

                let timeout = state.inner.blocking_timeout();
                match state.inner.read(&state.key, Some(state.index), timeout).await {
                    Ok(read) => {
                        state.backoff = state.inner.retry_base_delay;
                        state.index = next_index(state.index, read.index);
                        let event = change_event(&state.last, &read);
                        state.last = Some(read.value);
                        match event {
                            Some(event) => return Some((Ok(event), state)),
                            None => {
                                debug!(key = %state.key, index = state.index, "blocking query returned without change");
                                continue;
                            }
                        }
                    }
                    Err(e) => {
                        state.pending_delay = Some(state.backoff);
                        state.backoff = next_backoff(state.backoff, state.inner.retry_max_delay);
                        return Some((Err(e), state));
                    }
                }
            }
        });

        Ok(stream.boxed())
    }
}
