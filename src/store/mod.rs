//! Key-value store backends.
//!
//! The watch subscription manager only needs two things from a store: a point
//! read and a stream of change notifications for one key. Backends:
//!
//! - [`ConsulStore`]: Consul KV over HTTP, watched with blocking queries
//! - [`MemoryStore`]: in-process store for tests and local development

mod consul_store;
mod mem_store;

#[cfg(test)]
mod mem_store_test;

pub use consul_store::*;
pub use mem_store::*;

use async_trait::async_trait;
use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::StoreError;

/// Change delivered by a store watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Key was created or its value changed
    Put(String),
    /// Key was removed
    Delete,
}

/// Stream of changes for one key. Dropping it releases the watch.
pub type WatchStream = BoxStream<'static, std::result::Result<StoreEvent, StoreError>>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync + 'static {
    /// Reads the current value of `key`, `None` when absent.
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    /// Subscribes to changes of `key`.
    ///
    /// Errors here are watch-setup failures; errors yielded by the stream are
    /// transient and the stream keeps going.
    async fn watch(
        &self,
        key: &str,
    ) -> Result<WatchStream>;
}
