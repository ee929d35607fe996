//! Registry mode: the single authoritative registry instance.
//!
//! In this mode, the daemon:
//! 1. Creates the in-memory registry store
//! 2. Spawns the heartbeat sweeper
//! 3. Serves the HTTP API until Ctrl-C / SIGTERM
//! 4. Stops the sweeper and exits

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use anyhow::Context;
use beacon_core::RegistryConfig;
use beacon_registry::RegistryStore;
use beacon_sweeper::{HeartbeatSweeper, SweeperConfig};

use crate::signal::shutdown_signal;

/// Run the registry until a shutdown signal arrives.
pub async fn run_registry(config: RegistryConfig) -> anyhow::Result<()> {
    info!("beacon registry starting");

    // ── State store ──────────────────────────────────────────────
    let store = RegistryStore::new();

    // ── Shutdown signal ──────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Bind before starting background work ─────────────────────
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;

    // ── Heartbeat sweeper ────────────────────────────────────────
    let sweeper = HeartbeatSweeper::new(store.clone(), SweeperConfig::from(&config));
    let sweeper_handle = sweeper.spawn(shutdown_rx);

    // ── HTTP API ─────────────────────────────────────────────────
    let router = beacon_api::build_router(store);
    info!(addr = %local_addr, "registry listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    let _ = sweeper_handle.await;

    info!("beacon registry stopped");
    Ok(())
}
