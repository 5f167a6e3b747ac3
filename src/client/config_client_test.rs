use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::ConfigParamConfig;
use crate::ConfigParser;
use crate::ConsulConfig;
use crate::CustomFunction;
use crate::DefaultParser;
use crate::Error;
use crate::Key;
use crate::MemoryStore;
use crate::Settings;
use crate::ValueFormat;
use crate::WatchConfig;

fn memory_client() -> (MemoryStore, ConfigClient) {
    let store = MemoryStore::default();
    let client = ConfigClient::new(
        Arc::new(store.clone()),
        &ConsulConfig::default(),
        &WatchConfig::default(),
    );
    (store, client)
}

fn retry_param() -> ConfigParamConfig {
    ConfigParamConfig {
        category: "retry".into(),
        client_service_name: "frontend".into(),
        server_service_name: "echo".into(),
    }
}

#[test]
fn test_unique_ids_strictly_increase() {
    let (_store, client) = memory_client();
    let clone = client.clone();

    let first = client.allocate_unique_id();
    let second = clone.allocate_unique_id();
    let third = client.allocate_unique_id();

    assert!(first > 0);
    assert!(second > first);
    assert!(third > second);
}

#[test]
fn test_separate_clients_allocate_independently() {
    let (_s1, a) = memory_client();
    let (_s2, b) = memory_client();

    assert_eq!(a.allocate_unique_id(), 1);
    assert_eq!(b.allocate_unique_id(), 1);
}

#[test]
fn test_client_and_server_keys() {
    let (_store, client) = memory_client();

    let key = client.client_config_param(&retry_param(), &[]).unwrap();
    assert_eq!(key.store_key(), "KitexConfig/frontend/echo/retry");
    assert_eq!(key.value_format, ValueFormat::Json);

    let param = ConfigParamConfig {
        category: "limit".into(),
        server_service_name: "echo".into(),
        ..Default::default()
    };
    let key = client.server_config_param(&param, &[]).unwrap();
    assert_eq!(key.store_key(), "KitexConfig/echo/limit");
}

#[test]
fn test_custom_functions_rewrite_key() {
    let (_store, client) = memory_client();
    let to_yaml: CustomFunction = Arc::new(|key: &mut Key| {
        key.value_format = ValueFormat::Yaml;
        key.prefix = "Staging".into();
    });

    let key = client.client_config_param(&retry_param(), &[to_yaml]).unwrap();

    assert_eq!(key.store_key(), "Staging/frontend/echo/retry");
    assert_eq!(client.value_format(), ValueFormat::Json);
    assert_eq!(key.value_format, ValueFormat::Yaml);
}

#[tokio::test]
async fn test_register_and_deregister() {
    let (store, client) = memory_client();
    let key = client.client_config_param(&retry_param(), &[]).unwrap().store_key();
    store.put(&key, "{}");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_cb = seen.clone();
    let id = client.allocate_unique_id();

    client
        .register_config_callback(
            &key,
            id,
            Arc::new(move |data: &str, _parser: &dyn ConfigParser| {
                seen_in_cb.lock().push(data.to_string());
            }),
        )
        .await;

    assert_eq!(seen.lock().clone(), vec!["{}".to_string()]);
    assert!(client.is_registered(&key, id));
    assert_eq!(client.subscription_count(), 1);

    client.deregister_config(&key, id);
    assert_eq!(client.subscription_count(), 0);
}

#[tokio::test]
async fn test_shutdown_drops_every_subscription() {
    let (_store, client) = memory_client();
    for category in ["retry", "rpc_timeout"] {
        let id = client.allocate_unique_id();
        client
            .register_config_callback(category, id, Arc::new(|_: &str, _: &dyn ConfigParser| {}))
            .await;
    }
    assert_eq!(client.subscription_count(), 2);

    client.clone().shutdown();

    assert_eq!(client.subscription_count(), 0);
}

#[test]
fn test_builder_uses_given_store_and_parser() {
    let store = MemoryStore::default();
    let client = ConfigClient::builder(Settings::default())
        .store(Arc::new(store))
        .parser(Arc::new(DefaultParser))
        .build()
        .unwrap();

    assert_eq!(client.subscription_count(), 0);
}

#[test]
fn test_builder_rejects_invalid_settings() {
    let result = ConfigClient::builder(Settings::default())
        .consul(ConsulConfig {
            address: String::new(),
            ..Default::default()
        })
        .store(Arc::new(MemoryStore::default()))
        .build();

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
