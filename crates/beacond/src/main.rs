//! beacond: the beacon daemon.
//!
//! Single binary for both sides of the protocol:
//! - `serve`: the registry (state store, heartbeat sweeper, HTTP API)
//! - `agent`: keeps one node registered and tracks its peers
//! - `config`: prints the effective registry configuration
//!
//! # Usage
//!
//! ```text
//! beacond serve --port 8000 --sweep-interval 10s --liveness-timeout 15s
//! beacond agent --registry 10.0.0.10:8000 --address 10.0.0.1:9000
//! ```

mod agent_mode;
mod signal;
mod standalone;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::error;

use beacon_core::{RegistryConfig, parse_duration};

#[derive(Parser)]
#[command(name = "beacond", version, about = "Beacon service-discovery daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "BEACON_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the registry server.
    Serve(ServeArgs),

    /// Keep a node registered with a registry and track its peers.
    Agent(AgentArgs),

    /// Validate and print the effective registry configuration as TOML.
    Config(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Path to a beacon.toml file.
    #[arg(long, env = "BEACON_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to listen on.
    #[arg(long, env = "BEACON_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long, env = "BEACON_PORT")]
    port: Option<u16>,

    /// Time between expiry sweeps (e.g. "10s").
    #[arg(long, env = "BEACON_SWEEP_INTERVAL", value_parser = parse_duration)]
    sweep_interval: Option<Duration>,

    /// Silence after which a node is marked unhealthy (e.g. "15s").
    #[arg(long, env = "BEACON_LIVENESS_TIMEOUT", value_parser = parse_duration)]
    liveness_timeout: Option<Duration>,

    /// Remove unhealthy nodes silent for this long (e.g. "1h"). Unset
    /// keeps them forever.
    #[arg(long, env = "BEACON_EVICT_AFTER", value_parser = parse_duration)]
    evict_after: Option<Duration>,
}

impl ServeArgs {
    /// Defaults, then the config file, then flags and environment.
    fn resolve(&self) -> anyhow::Result<RegistryConfig> {
        let mut config = match &self.config {
            Some(path) => RegistryConfig::from_file(path)?,
            None => RegistryConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.sweep_interval {
            config.sweep_interval = interval;
        }
        if let Some(timeout) = self.liveness_timeout {
            config.liveness_timeout = timeout;
        }
        if self.evict_after.is_some() {
            config.evict_after = self.evict_after;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
struct AgentArgs {
    /// Registry address (host:port).
    #[arg(long, env = "BEACON_REGISTRY")]
    registry: String,

    /// Address this node advertises (host:port).
    #[arg(long, env = "BEACON_ADDRESS")]
    address: String,

    /// Time between heartbeats.
    #[arg(long, default_value = "5s", env = "BEACON_HEARTBEAT_INTERVAL", value_parser = parse_duration)]
    heartbeat_interval: Duration,

    /// Time between peer list refreshes.
    #[arg(long, default_value = "10s", env = "BEACON_DISCOVERY_INTERVAL", value_parser = parse_duration)]
    discovery_interval: Duration,

    /// Per-request deadline.
    #[arg(long, default_value = "3s", env = "BEACON_REQUEST_TIMEOUT", value_parser = parse_duration)]
    request_timeout: Duration,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,beacond=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let result = match cli.command {
        Command::Serve(args) => match args.resolve() {
            Ok(config) => standalone::run_registry(config).await,
            Err(e) => Err(e),
        },
        Command::Agent(args) => agent_mode::run_agent(args).await,
        Command::Config(args) => args.resolve().and_then(|config| {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }),
    };

    if let Err(e) = &result {
        error!(error = %e, "beacond exiting");
    }
    result
}
