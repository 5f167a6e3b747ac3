use futures::StreamExt;
use tokio::time::timeout;
use tokio::time::Duration;

use super::*;
use crate::WatchConfig;

#[tokio::test]
async fn get_returns_none_for_missing_key() {
    let store = MemoryStore::default();

    assert_eq!(store.get("KitexConfig/echo/limit").await.unwrap(), None);
}

#[tokio::test]
async fn put_then_get_returns_value() {
    let store = MemoryStore::default();
    store.put("k", "v1");

    assert_eq!(store.get("k").await.unwrap(), Some("v1".to_string()));
}

#[tokio::test]
async fn watcher_receives_puts_in_order() {
    let store = MemoryStore::default();
    let mut stream = store.watch("k").await.unwrap();

    store.put("k", "v1");
    store.put("k", "v2");

    let first = timeout(Duration::from_millis(100), stream.next()).await.unwrap();
    let second = timeout(Duration::from_millis(100), stream.next()).await.unwrap();

    assert_eq!(first.unwrap().unwrap(), StoreEvent::Put("v1".into()));
    assert_eq!(second.unwrap().unwrap(), StoreEvent::Put("v2".into()));
}

#[tokio::test]
async fn watcher_ignores_other_keys() {
    let store = MemoryStore::default();
    let mut stream = store.watch("k1").await.unwrap();

    store.put("k2", "v");

    assert!(timeout(Duration::from_millis(50), stream.next()).await.is_err());
}

#[tokio::test]
async fn delete_of_existing_key_notifies_watchers() {
    let store = MemoryStore::default();
    store.put("k", "v");
    let mut stream = store.watch("k").await.unwrap();

    store.delete("k");
    store.delete("k");

    let event = timeout(Duration::from_millis(100), stream.next()).await.unwrap();
    assert_eq!(event.unwrap().unwrap(), StoreEvent::Delete);
    assert!(timeout(Duration::from_millis(50), stream.next()).await.is_err());
}

#[tokio::test]
async fn dropping_stream_unregisters_watcher() {
    let store = MemoryStore::default();
    let first = store.watch("k").await.unwrap();
    let second = store.watch("k").await.unwrap();
    assert_eq!(store.watcher_count("k"), 2);

    drop(first);
    assert_eq!(store.watcher_count("k"), 1);

    drop(second);
    assert_eq!(store.watcher_count("k"), 0);
}

#[tokio::test]
async fn full_watcher_buffer_drops_events_without_blocking() {
    let store = MemoryStore::new(1);
    let mut stream = store.watch("k").await.unwrap();

    store.put("k", "v1");
    store.put("k", "v2");

    let event = timeout(Duration::from_millis(100), stream.next()).await.unwrap();
    assert_eq!(event.unwrap().unwrap(), StoreEvent::Put("v1".into()));
    assert!(timeout(Duration::from_millis(50), stream.next()).await.is_err());
    // the write itself always lands
    assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
}

#[tokio::test]
async fn watcher_buffer_size_comes_from_watch_config() {
    let store = MemoryStore::from_config(&WatchConfig {
        watcher_buffer_size: 2,
        ..Default::default()
    });
    let mut stream = store.watch("k").await.unwrap();

    store.put("k", "v1");
    store.put("k", "v2");
    store.put("k", "v3");

    let mut received = Vec::new();
    while let Ok(Some(event)) = timeout(Duration::from_millis(50), stream.next()).await {
        received.push(event.unwrap());
    }
    assert_eq!(
        received,
        vec![StoreEvent::Put("v1".into()), StoreEvent::Put("v2".into())]
    );
}

#[tokio::test]
async fn watch_rejects_empty_key() {
    let store = MemoryStore::default();

    assert!(store.watch("").await.is_err());
}
