//! End-to-end scenarios over real loopback sockets.
//!
//! These tests start real nodes, point discovery at each other's unicast
//! ports and run rooms over multicast pinned to the loopback interface.

use agora_node::{Node, NodeConfig, NodeError, NodeEvent};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn config(username: &str, multicast_port: u16) -> NodeConfig {
    NodeConfig {
        username: username.into(),
        unicast_port: 0,
        multicast_port,
        probe_addr: "127.0.0.1:9".parse().unwrap(),
        broadcast_addr: Some("127.0.0.1:1".parse().unwrap()),
        multicast_interface: Some(Ipv4Addr::LOCALHOST),
        resend_interval: Duration::from_millis(100),
        shutdown_timeout: Duration::from_secs(2),
        ..NodeConfig::default()
    }
}

/// Start a node whose discovery pings go straight to `target`'s port.
async fn start_node(username: &str, multicast_port: u16, target: Option<&Node>) -> Node {
    let mut cfg = config(username, multicast_port);
    if let Some(target) = target {
        cfg.broadcast_addr = Some(target.local_peer().addr);
    }
    Node::start(cfg).await.expect("node starts")
}

const DEADLINE: Duration = Duration::from_secs(2);
const POLL: Duration = Duration::from_millis(25);

async fn wait_for_peer(node: &Node, username: &str) {
    let found = timeout(DEADLINE, async {
        loop {
            if node
                .peers()
                .await
                .unwrap()
                .iter()
                .any(|p| p.username == username)
            {
                return;
            }
            sleep(POLL).await;
        }
    })
    .await;
    assert!(found.is_ok(), "peer '{username}' was never discovered");
}

async fn wait_for_no_peers(node: &Node) {
    let emptied = timeout(DEADLINE, async {
        loop {
            if node.peers().await.unwrap().is_empty() {
                return;
            }
            sleep(POLL).await;
        }
    })
    .await;
    assert!(emptied.is_ok(), "peer registry never emptied");
}

async fn wait_for_participating(node: &Node, room: &str) {
    let joined = timeout(DEADLINE, async {
        loop {
            if node
                .rooms()
                .await
                .unwrap()
                .participating
                .iter()
                .any(|r| r.name == room)
            {
                return;
            }
            sleep(POLL).await;
        }
    })
    .await;
    assert!(joined.is_ok(), "never joined room '{room}'");
}

async fn wait_for_no_rooms(node: &Node) {
    let emptied = timeout(DEADLINE, async {
        loop {
            let rooms = node.rooms().await.unwrap();
            if rooms.created.is_empty() && rooms.participating.is_empty() {
                return;
            }
            sleep(POLL).await;
        }
    })
    .await;
    assert!(emptied.is_ok(), "rooms were never dropped");
}

/// Two peers discover each other through one ping / one pong round.
#[tokio::test]
async fn test_two_peer_discovery() {
    let bob = start_node("bob", 19001, None).await;
    let alice = start_node("alice", 19001, Some(&bob)).await;

    alice.discover().await.unwrap();

    wait_for_peer(&bob, "alice").await;
    wait_for_peer(&alice, "bob").await;

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
}

/// Creating a room propagates membership, and a text is delivered to the
/// participant's shell with author attribution.
#[tokio::test]
async fn test_room_create_and_text_delivery() {
    let mut bob = start_node("bob", 19002, None).await;
    let mut bob_rx = bob.take_events().unwrap();

    let alice = start_node("alice", 19002, Some(&bob)).await;
    alice.discover().await.unwrap();
    wait_for_peer(&alice, "bob").await;

    let desc = alice.create_room("lounge", vec![1]).await.unwrap();
    assert_eq!(desc.members.len(), 2);

    wait_for_participating(&bob, "lounge").await;

    bob.enter_room("lounge").await.unwrap();
    alice.enter_room("lounge").await.unwrap();
    alice.send_text("hi").await.unwrap();

    // bob's shell sees the delivered line
    let event = timeout(DEADLINE, async {
        loop {
            match bob_rx.recv().await {
                Some(NodeEvent::TextDelivered { room, author, text }) => {
                    return (room, author, text)
                }
                Some(_) => continue,
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("text delivered within deadline");
    assert_eq!(event, ("lounge".into(), "alice".into(), "hi".into()));

    // the history is replayed on re-entry
    let view = bob.enter_room("lounge").await.unwrap();
    assert_eq!(view.messages, vec![("alice".to_string(), "hi".to_string())]);

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
}

/// A departing peer takes its rooms with it and unblocks waiting lists.
#[tokio::test]
async fn test_peer_departure_cleans_up() {
    let bob = start_node("bob", 19003, None).await;
    let alice = start_node("alice", 19003, Some(&bob)).await;

    alice.discover().await.unwrap();
    wait_for_peer(&alice, "bob").await;

    alice.create_room("lounge", vec![1]).await.unwrap();
    wait_for_participating(&bob, "lounge").await;

    // bob announces departure and waits for alice's ack
    bob.shutdown().await.unwrap();

    wait_for_no_peers(&alice).await;
    wait_for_no_rooms(&alice).await;

    alice.shutdown().await.unwrap();
}

/// Deleting a created room removes it on the participant side too.
#[tokio::test]
async fn test_room_deletion_propagates() {
    let bob = start_node("bob", 19004, None).await;
    let alice = start_node("alice", 19004, Some(&bob)).await;

    alice.discover().await.unwrap();
    wait_for_peer(&alice, "bob").await;

    alice.create_room("ephemeral", vec![1]).await.unwrap();
    wait_for_participating(&bob, "ephemeral").await;

    // only the creator may delete
    assert!(matches!(
        bob.delete_room("ephemeral").await,
        Err(NodeError::InvalidParameter(_))
    ));

    alice.delete_room("ephemeral").await.unwrap();
    wait_for_no_rooms(&bob).await;

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
}

/// Retransmission keeps re-offering a membership until it is acked, and
/// duplicate deliveries do not create duplicate rooms.
#[tokio::test]
async fn test_membership_resend_is_idempotent() {
    let bob = start_node("bob", 19005, None).await;
    let alice = start_node("alice", 19005, Some(&bob)).await;

    alice.discover().await.unwrap();
    wait_for_peer(&alice, "bob").await;

    alice.create_room("sturdy", vec![1]).await.unwrap();

    // sit through a few resend periods; late or duplicated offers must
    // all collapse into the one room
    sleep(Duration::from_millis(350)).await;
    wait_for_participating(&bob, "sturdy").await;
    assert_eq!(bob.rooms().await.unwrap().participating.len(), 1);

    alice.shutdown().await.unwrap();
    bob.shutdown().await.unwrap();
}
