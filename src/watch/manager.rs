use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::Instrument;
use tracing::trace;
use tracing::warn;

use crate::metrics::ACTIVE_WATCHES_METRIC;
use crate::ConfigParser;
use crate::ConfigStore;
use crate::DefaultParser;
use crate::StoreError;
use crate::StoreEvent;
use crate::WatchConfig;
use crate::WatchStream;

/// Receives the raw stored value and the parser to decode it with
pub type ConfigCallback = Arc<dyn Fn(&str, &dyn ConfigParser) + Send + Sync>;

type SharedParser = Arc<RwLock<Arc<dyn ConfigParser>>>;

/// Map key of one registration
pub fn subscription_key(
    key: &str,
    subscriber_id: i64,
) -> String {
    format!("{}/{}", key, subscriber_id)
}

struct Subscription {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the `(key, subscriber_id) -> watch task` mapping.
pub struct SubscriptionManager {
    store: Arc<dyn ConfigStore>,
    parser: SharedParser,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("subscriptions", &self.subscriptions.lock().len())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl SubscriptionManager {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            store,
            parser: Arc::new(RwLock::new(Arc::new(DefaultParser))),
            subscriptions: Mutex::new(HashMap::new()),
            fetch_timeout: config.fetch_timeout(),
        }
    }

    /// Replaces the parser handed to callbacks, including running watches.
    pub fn set_parser(
        &self,
        parser: Arc<dyn ConfigParser>,
    ) {
        *self.parser.write() = parser;
    }

    pub fn parser(&self) -> Arc<dyn ConfigParser> {
        self.parser.read().clone()
    }

    /// Registers `callback` for `key` under `subscriber_id`.
    ///
    /// When the key already holds a value, `callback` has run with it by the
    /// time this returns. Store failures are logged and never returned.
    /// Registering the same `(key, subscriber_id)` again replaces the earlier
    /// watch.
    pub async fn register_config_callback(
        &self,
        key: &str,
        subscriber_id: i64,
        callback: ConfigCallback,
    ) {
        // Watch first so a change racing the initial read is still delivered
        let stream = match self.store.watch(key).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(key, subscriber_id, "watch setup failed, no live updates: {}", e);
                None
            }
        };

        let initial = match timeout(self.fetch_timeout, self.store.get(key)).await {
            Ok(read) => read,
            Err(_) => Err(StoreError::Timeout {
                key: key.to_string(),
                duration: self.fetch_timeout,
            }
            .into()),
        };

        match initial {
            Ok(Some(value)) => {
                trace!(key, subscriber_id, "applying initial value");
                let parser = self.parser();
                callback(&value, parser.as_ref());
            }
            Ok(None) => {
                debug!(key, subscriber_id, "no initial value, keeping defaults");
            }
            Err(e) => {
                warn!(key, subscriber_id, "initial read failed, keeping defaults: {}", e);
            }
        }

        let Some(stream) = stream else {
            return;
        };

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_watch(
            key.to_string(),
            subscriber_id,
            stream,
            callback,
            self.parser.clone(),
            token.clone(),
        )
        .in_current_span());

        let previous = self
            .subscriptions
            .lock()
            .insert(subscription_key(key, subscriber_id), Subscription { token, handle });
        if let Some(previous) = previous {
            debug!(key, subscriber_id, "replacing existing watch");
            previous.token.cancel();
        }
    }

    /// Cancels the watch registered under `(key, subscriber_id)`.
    ///
    /// Unknown registrations are ignored.
    pub fn deregister_config(
        &self,
        key: &str,
        subscriber_id: i64,
    ) {
        let removed = self
            .subscriptions
            .lock()
            .remove(&subscription_key(key, subscriber_id));

        match removed {
            Some(subscription) => {
                subscription.token.cancel();
                debug!(key, subscriber_id, "watch deregistered");
            }
            None => {
                trace!(key, subscriber_id, "deregister of unknown subscription ignored");
            }
        }
    }

    pub fn is_registered(
        &self,
        key: &str,
        subscriber_id: i64,
    ) -> bool {
        self.subscriptions
            .lock()
            .contains_key(&subscription_key(key, subscriber_id))
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Whether the task behind a registration has exited
    pub fn is_finished(
        &self,
        key: &str,
        subscriber_id: i64,
    ) -> Option<bool> {
        self.subscriptions
            .lock()
            .get(&subscription_key(key, subscriber_id))
            .map(|s| s.handle.is_finished())
    }

    /// Cancels every watch.
    pub fn shutdown(&self) {
        let drained: Vec<_> = self.subscriptions.lock().drain().collect();
        for (name, subscription) in drained {
            subscription.token.cancel();
            trace!(subscription = %name, "watch cancelled on shutdown");
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().values() {
            subscription.token.cancel();
        }
    }
}

async fn run_watch(
    key: String,
    subscriber_id: i64,
    mut stream: WatchStream,
    callback: ConfigCallback,
    parser: SharedParser,
    token: CancellationToken,
) {
    ACTIVE_WATCHES_METRIC.inc();
    debug!(key = %key, subscriber_id, "watch started");

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                debug!(key = %key, subscriber_id, "watch cancelled");
                break;
            }

            event = stream.next() => {
                match event {
                    Some(Ok(StoreEvent::Put(value))) => {
                        let parser = parser.read().clone();
                        callback(&value, parser.as_ref());
                    }
                    Some(Ok(StoreEvent::Delete)) => {
                        info!(key = %key, subscriber_id, "key deleted from store, keeping last applied policy");
                    }
                    Some(Err(e)) => {
                        warn!(key = %key, subscriber_id, "watch error: {}", e);
                    }
                    None => {
                        warn!(key = %key, subscriber_id, "watch stream closed");
                        break;
                    }
                }
            }
        }
    }

    ACTIVE_WATCHES_METRIC.dec();
}
