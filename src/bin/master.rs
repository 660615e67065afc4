//! Master Endpoint Application
//!
//! Binds the sync transport and broadcasts playback state to every
//! connected slave. Commands typed on stdin stand in for the playback
//! engine; control requests arriving from slaves are echoed back out so
//! all peers converge on the same state.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lan_player_sync::{
    config::AppConfig, network::MasterTransport, protocol::SyncMessage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting playback sync master");

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(endpoint) = std::env::args().nth(1) {
        let (host, port) = endpoint
            .rsplit_once(':')
            .expect("Expected HOST:PORT bind address");
        config.network.host = host.to_owned();
        config.network.port = port.parse().expect("Invalid port");
    }

    let transport = MasterTransport::start(&config.network).await?;
    println!("Listening on {}", transport.local_addr());
    println!("Commands: P=play  p=pause  S=stop  <=half rate  >=double rate");
    println!("          <number>=position ms    seek <number>=discard + position");

    // Remember the endpoint for next time, like the original player did
    if let Err(e) = config.save() {
        tracing::debug!("Could not persist config: {}", e);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stats_tick = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            // Slave control requests: apply by re-broadcasting the command
            request = transport.dequeue_inbound() => {
                tracing::info!("Request from slave: {}", request);
                transport.enqueue_outbound(request);
            }

            // Stdin stands in for the playback engine
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(pos) = line.strip_prefix("seek ") {
                    // A seek invalidates every queued position update
                    transport.enqueue_outbound(SyncMessage::discard());
                    transport.enqueue_outbound(SyncMessage::parse(pos.trim()));
                } else {
                    transport.enqueue_outbound(SyncMessage::parse(line));
                }
            }

            _ = stats_tick.tick() => {
                let stats = transport.stats();
                tracing::info!(
                    "Stats: {} peers, {} sent, {} received, {} dropped",
                    transport.peer_count(),
                    stats.messages_sent(),
                    stats.messages_received(),
                    stats.peers_dropped()
                );
            }
        }
    }

    transport.shutdown().await;
    Ok(())
}
