//! Datagram receive loops.
//!
//! Listeners only receive, decode and forward; every decision happens in
//! the coordinator task. Malformed datagrams are dropped quietly, and a
//! closed socket or a gone coordinator ends the loop without noise.

use crate::event::Event;
use agora_proto::{WireMessage, MAX_DATAGRAM_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Receive loop for the shared unicast socket.
///
/// Broadcast discovery pings loop back to their own sender; those are
/// recognized by source address and skipped.
pub fn spawn_unicast(
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    events: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            let (len, src) = match socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    log::debug!("unicast listener stopping: {e}");
                    break;
                }
            };
            if src == local_addr {
                continue;
            }
            match WireMessage::decode(&buf[..len]) {
                Ok(msg) => {
                    log::trace!("received {} from {src}", msg.kind());
                    if events.send(Event::Wire { msg, src }).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::debug!("dropping malformed datagram from {src}: {e}"),
            }
        }
    })
}

/// Receive loop for one room's multicast group.
///
/// Multicast loopback delivers our own sends back to us, and the source
/// address alone cannot tell (other processes on this host share the ip),
/// so the filter is the sender id inside the decoded message.
pub fn spawn_multicast(
    socket: UdpSocket,
    local_id: Uuid,
    events: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            let (len, src) = match socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    log::debug!("multicast listener stopping: {e}");
                    break;
                }
            };
            match WireMessage::decode(&buf[..len]) {
                Ok(msg) => {
                    if msg.sender_id() == local_id {
                        continue;
                    }
                    log::trace!("received {} from {src} (group)", msg.kind());
                    if events.send(Event::Wire { msg, src }).await.is_err() {
                        break;
                    }
                }
                Err(e) => log::debug!("dropping malformed datagram from {src}: {e}"),
            }
        }
    })
}
