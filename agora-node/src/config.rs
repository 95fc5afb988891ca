//! Node configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Tunables for a chat node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Display name announced to other peers.
    pub username: String,
    /// Well-known unicast port every peer binds (0 = ephemeral, for tests).
    pub unicast_port: u16,
    /// Well-known port room multicast groups use.
    pub multicast_port: u16,
    /// Period between retransmissions of unacked messages.
    pub resend_interval: Duration,
    /// How long shutdown waits for LEAVE_NETWORK acks before giving up.
    pub shutdown_timeout: Duration,
    /// Address dummy-connected to discover the outbound interface.
    /// No traffic is sent; the kernel only resolves a route.
    pub probe_addr: SocketAddr,
    /// Where PING discovery datagrams go. `None` means the limited
    /// broadcast address on `unicast_port`.
    pub broadcast_addr: Option<SocketAddr>,
    /// Interface multicast rides on. `None` lets the OS pick; tests pin
    /// it to loopback.
    pub multicast_interface: Option<Ipv4Addr>,
    /// Depth of the coordinator event channel.
    pub event_capacity: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            username: "anonymous".to_string(),
            unicast_port: 9000,
            multicast_port: 9001,
            resend_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(5),
            probe_addr: "8.8.8.8:9000".parse().expect("static addr"),
            broadcast_addr: None,
            multicast_interface: None,
            event_capacity: 256,
        }
    }
}

impl NodeConfig {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.unicast_port, 9000);
        assert_eq!(config.multicast_port, 9001);
        assert_eq!(config.resend_interval, Duration::from_secs(1));
        assert!(config.broadcast_addr.is_none());
    }

    #[test]
    fn test_with_username() {
        let config = NodeConfig::with_username("alice");
        assert_eq!(config.username, "alice");
        assert_eq!(config.unicast_port, NodeConfig::default().unicast_port);
    }
}
