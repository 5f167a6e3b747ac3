use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rpc_config_center::ConfigClient;
use rpc_config_center::ConsulConfig;
use rpc_config_center::LimitOption;
use rpc_config_center::LimitUpdater;
use rpc_config_center::MemoryStore;
use rpc_config_center::WatchConfig;
use tokio::time::sleep;

pub fn memory_client() -> (MemoryStore, ConfigClient) {
    let watch = WatchConfig {
        fetch_timeout_ms: 500,
        ..Default::default()
    };
    let store = MemoryStore::from_config(&watch);
    let client = ConfigClient::new(Arc::new(store.clone()), &ConsulConfig::default(), &watch);
    (store, client)
}

/// Polls `condition` until it holds or a second has passed
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Limit updater that remembers every option it was given
#[derive(Default)]
pub struct RecordingUpdater {
    pub applied: Mutex<Vec<LimitOption>>,
}

impl LimitUpdater for RecordingUpdater {
    fn update_limit(
        &self,
        option: &LimitOption,
    ) -> bool {
        self.applied.lock().push(*option);
        true
    }
}
