use std::sync::Arc;

use rpc_config_center::metrics::gather_metrics;
use rpc_config_center::metrics::register_custom_metrics;
use rpc_config_center::ClientPolicies;
use rpc_config_center::ClientSuite;
use rpc_config_center::ConfigClient;
use rpc_config_center::ConfigParser;
use rpc_config_center::Error;
use rpc_config_center::LimitOption;
use rpc_config_center::LimitUpdater;
use rpc_config_center::Result;
use rpc_config_center::ServerPolicies;
use rpc_config_center::ServerSuite;
use rpc_config_center::Settings;
use rpc_config_center::SuiteOptions;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Updater standing in for a server's limiter; logs what it would apply.
struct LoggingUpdater {
    service: String,
}

impl LimitUpdater for LoggingUpdater {
    fn update_limit(
        &self,
        option: &LimitOption,
    ) -> bool {
        info!(
            service = %self.service,
            max_connections = option.max_connections,
            max_qps = option.max_qps,
            "limits updated"
        );
        true
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();
    register_custom_metrics();

    let mut settings = Settings::new()?;
    // optional override file, e.g. `policy-watch staging.toml`
    if let Some(path) = std::env::args().nth(1) {
        settings = settings.with_override_config(&path)?;
    }
    let settings = settings.validate()?;
    info!(address = %settings.consul.address, datacenter = %settings.consul.datacenter, "settings loaded");
    let services = settings.services.clone();

    let client = ConfigClient::builder(settings).build()?;

    let mut client_policies = Vec::with_capacity(services.dest_services.len());
    for dest in &services.dest_services {
        let suite = ClientSuite::new(dest, &services.client_service, client.clone(), SuiteOptions::default());
        let policies = suite.build().await?;
        watch_changes(&client, policies.keys()).await;
        client_policies.push(policies);
    }

    let server_policies = if services.server_service.is_empty() {
        None
    } else {
        let suite = ServerSuite::new(&services.server_service, client.clone(), SuiteOptions::default());
        let policies = suite.build().await?;
        watch_changes(&client, &[policies.key().to_string()]).await;
        policies.limiter.update_control(Arc::new(LoggingUpdater {
            service: services.server_service.clone(),
        }));
        Some(policies)
    };

    log_effective(&client_policies, server_policies.as_ref());
    info!("Application started. Waiting for CTRL+C signal...");

    if let Err(e) = graceful_shutdown().await {
        error!("Failed to wait for shutdown signal: {:?}", e);
    }

    for policies in &client_policies {
        policies.close();
    }
    if let Some(policies) = &server_policies {
        policies.shutdown();
    }
    client.shutdown();

    info!("final metrics:\n{}", gather_metrics());
    info!("Shutdown completed");
    Ok(())
}

/// Logs every raw change of `keys` under a subscriber of its own.
async fn watch_changes(
    client: &ConfigClient,
    keys: &[String],
) {
    let subscriber_id = client.allocate_unique_id();
    for key in keys {
        let logged_key = key.clone();
        client
            .register_config_callback(
                key,
                subscriber_id,
                Arc::new(move |data: &str, _parser: &dyn ConfigParser| {
                    info!(key = %logged_key, "policy changed: {}", data);
                }),
            )
            .await;
    }
}

fn log_effective(
    client_policies: &[ClientPolicies],
    server_policies: Option<&ServerPolicies>,
) {
    for policies in client_policies {
        info!(
            keys = ?policies.keys(),
            retry_methods = ?policies.retry.methods(),
            rpc_timeouts = ?policies.rpc_timeout.snapshot(),
            circuit_breaker = ?policies.circuit_breaker.config(),
            degradation = ?policies.degradation.config(),
            "effective client policies"
        );
    }
    if let Some(policies) = server_policies {
        info!(key = %policies.key(), limits = ?policies.limiter.current(), "effective server policies");
    }
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }
    info!("Shutdown server..");
    Ok(())
}

fn init_observability() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
