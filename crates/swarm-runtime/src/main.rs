//! # Swarm Runtime
//!
//! Runs a long-poll session for one user against the live network.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from `SWARM_*` environment variables
//! 2. Load configuration (TOML file from the first argument or
//!    `SWARM_CONFIG`, defaults otherwise)
//! 3. Build the client over the reqwest transport and in-memory storage
//! 4. Start the long-poller and log every received envelope
//! 5. Stop cleanly on Ctrl+C
//!
//! ## Environment
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SWARM_USER_KEY` | Hex public key whose mailbox is polled (required) |
//! | `SWARM_CONFIG` | Path to the TOML config file |

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use swarm_client::{
    ConfigProvider, InMemorySwarmDatabase, LongPoller, ReqwestTransport, StaticConfigProvider,
    SwarmClient, SwarmConfig, SystemTimeSource, TomlConfigProvider,
};
use swarm_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

fn load_config() -> Result<Box<dyn ConfigProvider>> {
    let path = env::args().nth(1).or_else(|| env::var("SWARM_CONFIG").ok());
    match path {
        Some(path) => {
            let provider = TomlConfigProvider::load(&path)
                .with_context(|| format!("loading config from {path}"))?;
            info!(path = %path, "Loaded configuration");
            Ok(Box::new(provider))
        }
        None => {
            info!("No config file given; using defaults");
            Ok(Box::new(StaticConfigProvider::new()))
        }
    }
}

/// The random snode pool can only bootstrap from seed nodes.
fn require_seed_nodes(config: &SwarmConfig) -> Result<()> {
    if config.seed_nodes.is_empty() {
        bail!("no seed nodes configured; add a [seed] nodes list to the config file");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    let _guard = init_telemetry(&telemetry).context("initializing telemetry")?;

    let provider = load_config()?;
    let config = provider.swarm_config();
    require_seed_nodes(&config)?;
    let user_key = env::var("SWARM_USER_KEY").context("SWARM_USER_KEY must be set")?;

    let transport =
        Arc::new(ReqwestTransport::new(&config).context("building HTTP transport")?);
    let client = Arc::new(SwarmClient::new(
        user_key.clone(),
        config,
        transport,
        Arc::new(InMemorySwarmDatabase::new()),
        Arc::new(SystemTimeSource::new()),
    ));

    let poller = LongPoller::new(
        Arc::clone(&client),
        Arc::new(|envelopes| {
            for envelope in envelopes {
                info!(hash = %envelope.hash, bytes = envelope.data.len(), "Received message");
            }
        }),
    );
    poller.start();

    info!(user = %user_key, "Polling. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl+C")?;

    poller.stop().await;
    if let Ok(metrics) = encode_metrics() {
        debug!(%metrics, "Final metrics");
    }
    Ok(())
}
