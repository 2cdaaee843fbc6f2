//! Console monitor: connects, prints throttled attitude and negotiation changes.
//!
//! Usage: `mavrate-monitor [config.yaml]`. Log verbosity follows `RUST_LOG`
//! (default `info`).

use anyhow::Context;
use futures::StreamExt;
use mavrate::{ClientConfig, TelemetryClient, UpdateRate};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => ClientConfig::default(),
    };

    let mut client = TelemetryClient::new(config);
    if let Err(e) = client.connect().await {
        for suggestion in e.recovery_suggestions() {
            warn!("  - {}", suggestion);
        }
        return Err(e).context("connecting to flight controller");
    }

    let mut attitude = client.attitude_updates(UpdateRate::Max(5));
    let mut states = client.state_updates();
    let mut status = client.status_updates();
    let mut last_mode = client.mode();
    let mut was_connected = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            Some(sample) = attitude.next() => {
                println!("{sample}  [{}]", client.current_rate());
            }
            Some(state) = states.next() => {
                if state.mode != last_mode {
                    info!("Stream mode {} -> {} at {}", last_mode, state.mode, state.rate);
                    last_mode = state.mode;
                }
            }
            Some(update) = status.next() => {
                info!("Link: {}", update.message);
                if update.connected {
                    was_connected = true;
                } else if was_connected {
                    break;
                }
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
