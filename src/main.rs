//! restrictd - restriction expiry daemon.
//!
//! Opens the restriction database, wires the configured capability adapter
//! into the engine, and runs the expiry sweeper plus the metrics endpoint
//! until interrupted.

use restrictd::adapter::{CapabilityAdapter, NoopAdapter, WebhookAdapter};
use restrictd::config::{AdapterKind, Config, validate};
use restrictd::db::Database;
use restrictd::restriction::{Engine, SystemClock};
use restrictd::sweeper::Sweeper;
use restrictd::{http, metrics};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "restrictd.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    let db_path = config.database_path();
    let db = Database::new(&db_path).await?;

    let adapter: Arc<dyn CapabilityAdapter> = match config.adapter.kind {
        AdapterKind::Webhook => {
            let url = config.adapter.url.clone().unwrap_or_default();
            info!(url = %url, "Using webhook capability adapter");
            Arc::new(WebhookAdapter::new(url, config.adapter.timeout()))
        }
        AdapterKind::Noop => {
            info!("No capability adapter configured. Using dry-run adapter.");
            Arc::new(NoopAdapter)
        }
    };

    let engine = Arc::new(
        Engine::new(Arc::new(db.clone()), adapter, Arc::new(SystemClock))
            .with_adapter_timeout(config.adapter.timeout()),
    );

    // Convention: metrics port 0 disables the HTTP endpoint.
    if config.metrics.port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        let port = config.metrics.port;
        tokio::spawn(async move {
            http::run_http_server(port).await;
        });
        info!(port, "Prometheus HTTP server started");
    }

    let sweeper = if config.sweeper.enabled {
        let handle = Sweeper::new(Arc::clone(&engine), config.sweeper.interval()).spawn();
        info!(
            interval_secs = config.sweeper.interval_secs,
            "Expiry sweeper started"
        );
        Some(handle)
    } else {
        info!("Expiry sweeper disabled");
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    if let Some(handle) = sweeper {
        handle.abort();
    }
    db.pool().close().await;

    Ok(())
}
