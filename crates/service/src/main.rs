//! OTA firmware delivery daemon (otad)

use anyhow::{Context, Result};
use fleet_ota_service::{router, AppState, CommandCompiler, ServiceConfig};
use openfleet_delivery::{AssignmentLedger, DeliveryService, EventLog, FirmwareRegistry};
use openfleet_store::OtaStore;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_ota_service=debug,info".into()),
        )
        .init();

    info!("Starting OTA delivery service v{}", env!("CARGO_PKG_VERSION"));

    let config = match ServiceConfig::load().await {
        Ok(Some(config)) => config,
        Ok(None) => ServiceConfig::default(),
        Err(e) => {
            warn!("Failed to load config, using defaults: {e:#}");
            ServiceConfig::default()
        }
    };

    tokio::fs::create_dir_all(&config.firmware_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create firmware dir {}",
                config.firmware_dir.display()
            )
        })?;

    let store = Arc::new(
        OtaStore::open(config.store_path.clone())
            .await
            .context("Failed to open OTA store")?,
    );

    let registry = FirmwareRegistry::new(store.clone());
    let assignments = AssignmentLedger::new(store.clone());
    let events = EventLog::new(store);
    let delivery = DeliveryService::new(registry.clone(), assignments.clone());
    let compiler = Arc::new(CommandCompiler::new(
        config.compiler.clone(),
        config.build_dir.clone(),
        config.firmware_dir.clone(),
    ));

    let state = AppState {
        registry,
        assignments,
        events,
        delivery,
        compiler,
    };

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
