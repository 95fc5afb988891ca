//! Room descriptor and chat text payload.

use crate::peer::Peer;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

/// Everything a peer needs to participate in a room.
///
/// The creator picks the multicast group and ships the whole descriptor in
/// ROOM_MEMBERSHIP, so every member joins the same group and knows every
/// other member's unicast address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomDesc {
    pub id: Uuid,
    pub name: String,
    /// Multicast group the room's traffic rides on.
    pub group: SocketAddr,
    /// Every member, creator included.
    pub members: Vec<Peer>,
}

impl RoomDesc {
    pub fn new(name: impl Into<String>, group: SocketAddr, members: Vec<Peer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            group,
            members,
        }
    }

    pub fn member(&self, id: Uuid) -> Option<&Peer> {
        self.members.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.member(id).is_some()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.members.iter().map(|p| p.id)
    }

    /// Members other than `id` (normally the local peer).
    pub fn others(&self, id: Uuid) -> impl Iterator<Item = &Peer> {
        self.members.iter().filter(move |p| p.id != id)
    }
}

/// One chat line inside a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomText {
    pub room_id: Uuid,
    pub author: Uuid,
    pub text: String,
}
