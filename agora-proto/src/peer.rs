//! Peer identity with display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use uuid::Uuid;

/// A participant in the network.
///
/// The identifier is minted once at startup and stays stable for the
/// lifetime of the process; the address is the unicast endpoint other
/// peers reach this one at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Peer {
    pub id: Uuid,
    pub username: String,
    pub addr: SocketAddr,
}

impl Peer {
    pub fn new(username: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            addr,
        }
    }

    /// Create with an explicit id (for testing)
    pub fn with_id(id: Uuid, username: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            id,
            username: username.into(),
            addr,
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}
