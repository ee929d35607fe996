//! Agent mode: runs next to a worker and keeps it registered.

use tokio::sync::watch;
use tracing::info;

use beacon_agent::{AgentConfig, NodeAgent};

use crate::AgentArgs;
use crate::signal::shutdown_signal;

/// Run the node agent until a shutdown signal arrives.
pub async fn run_agent(args: AgentArgs) -> anyhow::Result<()> {
    if args.address.trim().is_empty() {
        anyhow::bail!("--address must not be empty");
    }
    if args.heartbeat_interval.is_zero() || args.discovery_interval.is_zero() {
        anyhow::bail!("heartbeat and discovery intervals must be greater than zero");
    }

    info!("beacon agent starting");

    let agent = NodeAgent::new(AgentConfig {
        registry_addr: args.registry,
        address: args.address,
        heartbeat_interval: args.heartbeat_interval,
        discovery_interval: args.discovery_interval,
        request_timeout: args.request_timeout,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_handle = tokio::spawn(shutdown_signal(shutdown_tx));

    agent.run(shutdown_rx).await;
    signal_handle.abort();

    info!(peers = agent.peers().len().await, "beacon agent stopped");
    Ok(())
}
