use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;


lazy_static! {
    pub static ref POLICY_UPDATES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("policy_updates_total", "Policy documents applied to a container"),
        &["category"]
    )
    .expect("metric can not be created");

    pub static ref DECODE_FAILURES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("policy_decode_failures_total", "Payloads skipped because they failed to decode"),
        &["category"]
    )
    .expect("metric can not be created");

    pub static ref REJECTED_POLICIES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("policy_rejected_entries_total", "Entries skipped by validation"),
        &["category"]
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_WATCHES_METRIC: IntGauge =
        IntGauge::new("policy_active_watches", "Running watch tasks")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(POLICY_UPDATES_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(DECODE_FAILURES_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(REJECTED_POLICIES_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(ACTIVE_WATCHES_METRIC.clone()))
            .expect("collector can be registered");
    });
}

/// Renders every registered metric in the Prometheus text format
pub fn gather_metrics() -> String {
    register_custom_metrics();

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
        return String::default();
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

pub(crate) fn record_update(category: &str) {
    POLICY_UPDATES_METRIC.with_label_values(&[category]).inc();
}

pub(crate) fn record_decode_failure(category: &str) {
    DECODE_FAILURES_METRIC.with_label_values(&[category]).inc();
}

pub(crate) fn record_rejection(category: &str) {
    REJECTED_POLICIES_METRIC.with_label_values(&[category]).inc();
}
