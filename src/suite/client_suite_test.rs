use std::sync::Arc;

use tokio::time::sleep;
use tokio::time::Duration;

use super::*;
use crate::AclRule;
use crate::ConfigClient;
use crate::ConsulConfig;
use crate::Key;
use crate::MemoryStore;
use crate::TimeoutProvider;
use crate::ValueFormat;
use crate::WatchConfig;

const RETRY_KEY: &str = "KitexConfig/frontend/echo/retry";
const TIMEOUT_KEY: &str = "KitexConfig/frontend/echo/rpc_timeout";
const CB_KEY: &str = "KitexConfig/frontend/echo/circuit_break";
const DEGRADATION_KEY: &str = "KitexConfig/frontend/echo/degradation";

fn memory_client() -> (MemoryStore, ConfigClient) {
    let store = MemoryStore::default();
    let client = ConfigClient::new(
        Arc::new(store.clone()),
        &ConsulConfig::default(),
        &WatchConfig::default(),
    );
    (store, client)
}

#[tokio::test]
async fn test_build_registers_every_client_category() {
    let (store, client) = memory_client();
    let suite = ClientSuite::new("echo", "frontend", client.clone(), SuiteOptions::default());

    let policies = suite.build().await.unwrap();

    assert_eq!(policies.keys(), &[RETRY_KEY, TIMEOUT_KEY, CB_KEY, DEGRADATION_KEY]);
    assert_eq!(client.subscription_count(), 4);
    for key in policies.keys() {
        assert_eq!(store.watcher_count(key), 1);
        assert!(client.is_registered(key, suite.subscriber_id()));
    }
}

#[tokio::test]
async fn test_stored_values_are_applied_by_build() {
    let (store, client) = memory_client();
    store.put(
        RETRY_KEY,
        r#"{"*": {"enable": true, "type": 1, "backup_policy": {"retry_delay_ms": 20}}}"#,
    );
    store.put(TIMEOUT_KEY, r#"{"Echo": {"rpc_timeout_ms": 150}}"#);
    store.put(CB_KEY, r#"{"enable": true, "err_rate": 0.2, "min_sample": 5}"#);
    store.put(DEGRADATION_KEY, r#"{"enable": true, "percentage": 100}"#);

    let policies = ClientSuite::new("echo", "frontend", client, SuiteOptions::default())
        .build()
        .await
        .unwrap();

    assert!(policies.retry.policy("Anything").is_some());
    assert_eq!(policies.rpc_timeout.timeouts("Echo").map(|t| t.rpc_timeout_ms), Some(150));
    assert!(policies.circuit_breaker.config().enable);
    assert!(policies.degradation.check("Echo").is_err());
}

#[tokio::test]
async fn test_close_deregisters_and_clears_retry() {
    let (store, client) = memory_client();
    store.put(
        RETRY_KEY,
        r#"{"Ping": {"enable": true, "type": 0, "failure_policy": {}}}"#,
    );
    let policies = ClientSuite::new("echo", "frontend", client.clone(), SuiteOptions::default())
        .build()
        .await
        .unwrap();
    assert_eq!(policies.retry.len(), 1);

    policies.close();
    policies.close();

    assert_eq!(client.subscription_count(), 0);
    assert!(policies.retry.is_empty());
    store.put(TIMEOUT_KEY, r#"{"Echo": {"rpc_timeout_ms": 1}}"#);
    sleep(Duration::from_millis(30)).await;
    assert_eq!(policies.rpc_timeout.timeouts("Echo"), None);
}

#[tokio::test]
async fn test_two_suites_on_same_pair_are_independent() {
    let (store, client) = memory_client();
    let first = ClientSuite::new("echo", "frontend", client.clone(), SuiteOptions::default());
    let second = ClientSuite::new("echo", "frontend", client.clone(), SuiteOptions::default());
    assert_ne!(first.subscriber_id(), second.subscriber_id());

    let a = first.build().await.unwrap();
    let b = second.build().await.unwrap();
    a.close();

    store.put(CB_KEY, r#"{"enable": true}"#);
    for _ in 0..100 {
        if b.circuit_breaker.config().enable {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(b.circuit_breaker.config().enable);
    assert!(!a.circuit_breaker.config().enable);
    assert_eq!(client.subscription_count(), 4);
}

#[tokio::test]
async fn test_custom_functions_apply_to_every_key() {
    let (store, client) = memory_client();
    store.put("Staging/frontend/echo/rpc_timeout", "Echo:\n  rpc_timeout_ms: 75\n");
    let options = SuiteOptions::new().with_custom_function(|key: &mut Key| {
        key.prefix = "Staging".into();
        key.value_format = ValueFormat::Yaml;
    });

    let policies = ClientSuite::new("echo", "frontend", client, options)
        .build()
        .await
        .unwrap();

    assert!(policies.keys().iter().all(|k| k.starts_with("Staging/")));
    assert_eq!(policies.rpc_timeout.timeouts("Echo").map(|t| t.rpc_timeout_ms), Some(75));
}

#[tokio::test]
async fn test_bad_template_registers_nothing() {
    let store = MemoryStore::default();
    let consul = ConsulConfig {
        client_path_template: "{clientServiceName}/{nope}/{category}".into(),
        ..Default::default()
    };
    let client = ConfigClient::new(Arc::new(store), &consul, &WatchConfig::default());

    let result = ClientSuite::new("echo", "frontend", client.clone(), SuiteOptions::default())
        .build()
        .await;

    assert!(result.is_err());
    assert_eq!(client.subscription_count(), 0);
}
