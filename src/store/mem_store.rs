//! In-process key-value store with per-key watchers.
//!
//! Writers never block: events are handed to each watcher with `try_send` and
//! dropped when a watcher's buffer is full. Watchers are unregistered when
//! their stream is dropped.

use std::pin::Pin;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::trace;
use tracing::warn;

use super::ConfigStore;
use super::StoreEvent;
use super::WatchStream;
use crate::Result;
use crate::StoreError;
use crate::WatchConfig;

#[derive(Debug)]
struct Watcher {
    id: u64,
    sender: mpsc::Sender<StoreEvent>,
}

#[derive(Debug)]
struct MemoryStoreInner {
    values: DashMap<String, String>,

    /// Watchers grouped by key
    watchers: DashMap<String, Vec<Watcher>>,

    next_id: AtomicU64,

    buffer_size: usize,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_config(&WatchConfig::default())
    }
}

impl MemoryStore {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(MemoryStoreInner {
                values: DashMap::new(),
                watchers: DashMap::new(),
                next_id: AtomicU64::new(1),
                buffer_size: buffer_size.max(1),
            }),
        }
    }

    /// Store whose watchers buffer `watch.watcher_buffer_size` events
    pub fn from_config(watch: &WatchConfig) -> Self {
        Self::new(watch.watcher_buffer_size)
    }

    /// Stores `value` under `key` and notifies its watchers.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        let key = key.into();
        let value = value.into();
        self.inner.values.insert(key.clone(), value.clone());
        self.notify(&key, StoreEvent::Put(value));
    }

    /// Removes `key` and notifies its watchers if it existed.
    pub fn delete(
        &self,
        key: &str,
    ) {
        if self.inner.values.remove(key).is_some() {
            self.notify(key, StoreEvent::Delete);
        }
    }

    /// Number of live watchers on `key`
    pub fn watcher_count(
        &self,
        key: &str,
    ) -> usize {
        self.inner.watchers.get(key).map(|w| w.len()).unwrap_or(0)
    }

    fn notify(
        &self,
        key: &str,
        event: StoreEvent,
    ) {
        let Some(watchers) = self.inner.watchers.get(key) else {
            return;
        };
        for watcher in watchers.iter() {
            if let Err(e) = watcher.sender.try_send(event.clone()) {
                warn!(watcher_id = watcher.id, key, "dropping store event: {}", e);
            }
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.inner.values.get(key).map(|v| v.value().clone()))
    }

    async fn watch(
        &self,
        key: &str,
    ) -> Result<WatchStream> {
        if key.is_empty() {
            return Err(StoreError::InvalidWatch {
                key: key.to_string(),
                reason: "key must not be empty".into(),
            }
            .into());
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.buffer_size);
        self.inner
            .watchers
            .entry(key.to_string())
            .or_default()
            .push(Watcher { id, sender });

        trace!(watcher_id = id, key, "memory watcher registered");

        Ok(Box::pin(MemoryWatchStream {
            receiver: ReceiverStream::new(receiver),
            _guard: WatcherGuard {
                id,
                key: key.to_string(),
                inner: self.inner.clone(),
            },
        }))
    }
}

/// Unregisters its watcher on drop
struct WatcherGuard {
    id: u64,
    key: String,
    inner: Arc<MemoryStoreInner>,
}

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        // Atomically drop the key entry once its last watcher is gone
        self.inner.watchers.remove_if_mut(&self.key, |_key, watchers| {
            watchers.retain(|w| w.id != self.id);
            watchers.is_empty()
        });
        trace!(watcher_id = self.id, key = %self.key, "memory watcher unregistered");
    }
}

struct MemoryWatchStream {
    receiver: ReceiverStream<StoreEvent>,
    _guard: WatcherGuard,
}

impl Stream for MemoryWatchStream {
    type Item = std::result::Result<StoreEvent, StoreError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx).map(|event| event.map(Ok))
    }
}
