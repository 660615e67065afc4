//! End-to-end transport tests over loopback TCP
//!
//! Every test runs a real master with real slave links on 127.0.0.1, bound
//! to an ephemeral port.

use std::time::Duration;

use lan_player_sync::config::NetworkConfig;
use lan_player_sync::network::{MasterTransport, PeerLink};
use lan_player_sync::protocol::SyncMessage;

const WAIT: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(10);

async fn start_master() -> MasterTransport {
    let config = NetworkConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
    };
    MasterTransport::start(&config).await.unwrap()
}

/// Poll until `cond` holds or the deadline passes.
async fn wait_until<F: Fn() -> bool>(cond: F, what: &str) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {}",
            what
        );
        tokio::time::sleep(POLL).await;
    }
}

async fn connect_slaves(master: &MasterTransport, n: usize) -> Vec<PeerLink> {
    let addr = master.local_addr();
    let mut links = Vec::with_capacity(n);
    for _ in 0..n {
        links.push(PeerLink::connect(addr).await.unwrap());
    }
    wait_until(|| master.peer_count() == n, "all slaves registered").await;
    links
}

#[tokio::test]
async fn broadcast_reaches_every_peer_exactly_once() {
    let master = start_master().await;
    let links = connect_slaves(&master, 3).await;

    master.enqueue_outbound(SyncMessage::Position(42_000));

    for link in &links {
        let update = tokio::time::timeout(WAIT, link.next_update())
            .await
            .expect("peer never received the broadcast");
        assert_eq!(update, SyncMessage::Position(42_000));
    }

    // Exactly once: nothing further is pending anywhere
    tokio::time::sleep(Duration::from_millis(50)).await;
    for link in &links {
        assert_eq!(link.try_next_update(), None);
    }

    master.shutdown().await;
}

#[tokio::test]
async fn dead_peer_is_dropped_and_others_still_delivered() {
    let master = start_master().await;
    let links = connect_slaves(&master, 3).await;

    // Forcibly close one slave's socket before the broadcast round
    links[0].shutdown().await;
    wait_until(|| master.peer_count() == 2, "dead peer removed").await;

    master.enqueue_outbound(SyncMessage::Play);

    for link in &links[1..] {
        let update = tokio::time::timeout(WAIT, link.next_update())
            .await
            .expect("surviving peer missed the broadcast");
        assert_eq!(update, SyncMessage::Play);
    }
    assert_eq!(master.peer_count(), 2);

    master.shutdown().await;
}

#[tokio::test]
async fn discard_marker_clears_pending_position_updates() {
    let master = start_master().await;
    let links = connect_slaves(&master, 1).await;
    let link = &links[0];

    master.enqueue_outbound(SyncMessage::Position(100));
    master.enqueue_outbound(SyncMessage::Position(200));
    master.enqueue_outbound(SyncMessage::Discard("seek-d".to_owned()));
    master.enqueue_outbound(SyncMessage::Position(300));

    // The marker is consumed by the receive loop strictly between 200 and
    // 300, so once three non-discard updates have been processed the
    // pending queue must hold only the post-seek position.
    wait_until(
        || link.stats().messages_received() == 3,
        "all updates processed",
    )
    .await;

    assert_eq!(link.try_next_update(), Some(SyncMessage::Position(300)));
    assert_eq!(link.try_next_update(), None);

    master.shutdown().await;
}

#[tokio::test]
async fn per_connection_delivery_is_fifo() {
    let master = start_master().await;
    let links = connect_slaves(&master, 1).await;
    let link = &links[0];

    for ms in 0..100u64 {
        master.enqueue_outbound(SyncMessage::Position(ms));
    }

    for ms in 0..100u64 {
        let update = tokio::time::timeout(WAIT, link.next_update())
            .await
            .expect("update missing");
        assert_eq!(update, SyncMessage::Position(ms));
    }

    master.shutdown().await;
}

#[tokio::test]
async fn slave_requests_reach_the_master_in_order() {
    let master = start_master().await;
    let links = connect_slaves(&master, 1).await;
    let link = &links[0];

    link.enqueue_request(SyncMessage::HalveRate);
    link.enqueue_request(SyncMessage::Play);
    link.enqueue_request(SyncMessage::Pause);
    link.enqueue_request(SyncMessage::Stop);
    link.enqueue_request(SyncMessage::DoubleRate);

    for expected in [
        SyncMessage::HalveRate,
        SyncMessage::Play,
        SyncMessage::Pause,
        SyncMessage::Stop,
        SyncMessage::DoubleRate,
    ] {
        let request = tokio::time::timeout(WAIT, master.dequeue_inbound())
            .await
            .expect("request missing");
        assert_eq!(request, expected);
    }

    master.shutdown().await;
}

#[tokio::test]
async fn unknown_payloads_pass_through_untouched() {
    let master = start_master().await;
    let links = connect_slaves(&master, 1).await;

    master.enqueue_outbound(SyncMessage::Other("mystery".to_owned()));

    let update = tokio::time::timeout(WAIT, links[0].next_update())
        .await
        .expect("passthrough missing");
    assert_eq!(update, SyncMessage::Other("mystery".to_owned()));

    master.shutdown().await;
}

#[tokio::test]
async fn master_shutdown_closes_slave_links() {
    let master = start_master().await;
    let links = connect_slaves(&master, 2).await;

    master.shutdown().await;

    wait_until(
        || links.iter().all(|link| !link.is_connected()),
        "slaves noticed the shutdown",
    )
    .await;
}

#[tokio::test]
async fn connect_to_dead_endpoint_fails_fast() {
    // Bind and immediately drop to get a port nobody is listening on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = PeerLink::connect(addr).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn bind_failure_is_fatal_at_setup() {
    let config = NetworkConfig {
        host: "203.0.113.1".to_owned(), // TEST-NET, not routable locally
        port: 1,
    };
    let result = MasterTransport::start(&config).await;
    assert!(result.is_err());
}
