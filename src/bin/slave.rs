//! Slave Endpoint Application
//!
//! Connects to a running master and mirrors its playback state. Incoming
//! updates are printed where a real player would apply them; commands
//! typed on stdin are sent to the master as control requests.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_player_sync::{config::AppConfig, network::PeerLink, protocol::SyncMessage};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting playback sync slave");

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(endpoint) = std::env::args().nth(1) {
        let (host, port) = endpoint
            .rsplit_once(':')
            .expect("Expected HOST:PORT master address");
        config.network.host = host.to_owned();
        config.network.port = port.parse().expect("Invalid port");
    }

    let link = PeerLink::connect(config.network.endpoint()).await?;
    println!("Connected to master at {}", link.remote_addr());
    println!("Commands: P=play  p=pause  S=stop  <=half rate  >=double rate");

    if let Err(e) = config.save() {
        tracing::debug!("Could not persist config: {}", e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stats_tick = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            // State updates from the master; a real player would apply these
            update = link.next_update() => {
                match update {
                    SyncMessage::Position(ms) => tracing::debug!("Position update: {}ms", ms),
                    other => tracing::info!("State update: {}", other),
                }
            }

            // Stdin stands in for the local player's control surface
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                link.enqueue_request(SyncMessage::parse(line));
            }

            _ = stats_tick.tick() => {
                if !link.is_connected() {
                    tracing::warn!("Link to master lost, exiting");
                    break;
                }
                let stats = link.stats();
                tracing::info!(
                    "Stats: {} updates received, {} requests sent",
                    stats.messages_received(),
                    stats.messages_sent()
                );
            }
        }
    }

    link.shutdown().await;
    Ok(())
}
