//! The single outbound send path.

use crate::error::Result;
use agora_proto::WireMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Encodes and writes one message per call to whatever address the caller
/// picked: a peer's unicast endpoint, the broadcast address, or a room's
/// multicast group. Holds no retry state; retransmission is the ack
/// tables' business.
#[derive(Clone)]
pub struct Sender {
    socket: Arc<UdpSocket>,
}

impl Sender {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }

    pub async fn send(&self, msg: &WireMessage, dest: SocketAddr) -> Result<()> {
        let bytes = msg.encode()?;
        self.socket.send_to(&bytes, dest).await?;
        log::trace!("sent {} ({} bytes) to {dest}", msg.kind(), bytes.len());
        Ok(())
    }
}
