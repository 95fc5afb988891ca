//! Tagged datagram codec.
//!
//! One `WireMessage` per UDP datagram, bincode-encoded. The discriminant
//! tags the payload so a listener can decode without out-of-band context.
//!
//! | Kind            | Transport            | Payload                          |
//! |-----------------|----------------------|----------------------------------|
//! | Ping            | broadcast            | sender peer                      |
//! | Pong            | unicast              | sender peer                      |
//! | RoomMembership  | unicast, per member  | full room descriptor + ack id    |
//! | DeleteRoom      | multicast            | room id + ack id                 |
//! | RoomText        | multicast            | text + clock snapshot + ack id   |
//! | LeaveNetwork    | unicast, per peer    | sender peer + ack id             |
//! | AckUnicast      | unicast              | sender id + ack id               |
//! | AckMulticast    | unicast              | sender id + ack id               |

use crate::clock::VectorClock;
use crate::peer::Peer;
use crate::room::{RoomDesc, RoomText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard UDP payload ceiling (IPv4, 20 B IP + 8 B UDP headers).
pub const MAX_DATAGRAM_LEN: usize = 65_507;

/// What a message should fit in to dodge LAN fragmentation.
pub const TARGET_DATAGRAM_LEN: usize = 1_500;

/// Every message kind that crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WireMessage {
    Ping {
        peer: Peer,
    },
    Pong {
        peer: Peer,
    },
    RoomMembership {
        sender: Uuid,
        room: RoomDesc,
        ack_id: Uuid,
    },
    DeleteRoom {
        sender: Uuid,
        room_id: Uuid,
        ack_id: Uuid,
    },
    RoomText {
        text: RoomText,
        clock: VectorClock,
        ack_id: Uuid,
    },
    LeaveNetwork {
        peer: Peer,
        ack_id: Uuid,
    },
    AckUnicast {
        sender: Uuid,
        ack_id: Uuid,
    },
    AckMulticast {
        sender: Uuid,
        ack_id: Uuid,
    },
}

impl WireMessage {
    /// Serialize to the datagram payload.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| WireError::Encode(e.to_string()))?;
        if bytes.len() > MAX_DATAGRAM_LEN {
            return Err(WireError::Oversize(bytes.len()));
        }
        Ok(bytes)
    }

    /// Deserialize from a received datagram payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (msg, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| WireError::Decode(e.to_string()))?;
        Ok(msg)
    }

    /// The id of the peer that originated this message.
    ///
    /// Multicast listeners use this to drop their own loopback traffic.
    pub fn sender_id(&self) -> Uuid {
        match self {
            WireMessage::Ping { peer }
            | WireMessage::Pong { peer }
            | WireMessage::LeaveNetwork { peer, .. } => peer.id,
            WireMessage::RoomMembership { sender, .. }
            | WireMessage::DeleteRoom { sender, .. }
            | WireMessage::AckUnicast { sender, .. }
            | WireMessage::AckMulticast { sender, .. } => *sender,
            WireMessage::RoomText { text, .. } => text.author,
        }
    }

    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Ping { .. } => "PING",
            WireMessage::Pong { .. } => "PONG",
            WireMessage::RoomMembership { .. } => "ROOM_MEMBERSHIP",
            WireMessage::DeleteRoom { .. } => "DELETE_ROOM",
            WireMessage::RoomText { .. } => "ROOM_TEXT",
            WireMessage::LeaveNetwork { .. } => "LEAVE_NETWORK",
            WireMessage::AckUnicast { .. } => "ACK_UNI",
            WireMessage::AckMulticast { .. } => "ACK_MULTI",
        }
    }
}

/// Codec errors.
#[derive(Debug, Clone)]
pub enum WireError {
    Encode(String),
    Decode(String),
    /// Encoded message would not fit in one datagram.
    Oversize(usize),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Oversize(len) => {
                write!(f, "message of {len} bytes exceeds {MAX_DATAGRAM_LEN}")
            }
        }
    }
}

impl std::error::Error for WireError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr() -> SocketAddr {
        "192.168.0.7:9000".parse().unwrap()
    }

    fn group() -> SocketAddr {
        "239.4.5.6:9001".parse().unwrap()
    }

    fn peer(n: u128) -> Peer {
        Peer::with_id(Uuid::from_u128(n), format!("peer{n}"), addr())
    }

    fn roundtrip(msg: WireMessage) -> WireMessage {
        let encoded = msg.encode().unwrap();
        WireMessage::decode(&encoded).unwrap()
    }

    #[test]
    fn test_ping_pong_roundtrip() {
        let ping = WireMessage::Ping { peer: peer(1) };
        let pong = WireMessage::Pong { peer: peer(2) };

        assert_eq!(roundtrip(ping.clone()), ping);
        assert_eq!(roundtrip(pong.clone()), pong);
    }

    #[test]
    fn test_room_membership_roundtrip() {
        let msg = WireMessage::RoomMembership {
            sender: Uuid::from_u128(1),
            room: RoomDesc::new("lounge", group(), vec![peer(1), peer(2)]),
            ack_id: Uuid::new_v4(),
        };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn test_delete_room_roundtrip() {
        let msg = WireMessage::DeleteRoom {
            sender: Uuid::from_u128(1),
            room_id: Uuid::new_v4(),
            ack_id: Uuid::new_v4(),
        };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn test_room_text_roundtrip() {
        let mut clock = VectorClock::new();
        clock.increment(Uuid::from_u128(1));

        let msg = WireMessage::RoomText {
            text: RoomText {
                room_id: Uuid::new_v4(),
                author: Uuid::from_u128(1),
                text: "hello there".into(),
            },
            clock,
            ack_id: Uuid::new_v4(),
        };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn test_leave_network_roundtrip() {
        let msg = WireMessage::LeaveNetwork {
            peer: peer(3),
            ack_id: Uuid::new_v4(),
        };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn test_ack_roundtrip() {
        let uni = WireMessage::AckUnicast {
            sender: Uuid::from_u128(1),
            ack_id: Uuid::new_v4(),
        };
        let multi = WireMessage::AckMulticast {
            sender: Uuid::from_u128(2),
            ack_id: Uuid::new_v4(),
        };

        assert_eq!(roundtrip(uni.clone()), uni);
        assert_eq!(roundtrip(multi.clone()), multi);
    }

    #[test]
    fn test_sender_id_per_kind() {
        let author = Uuid::from_u128(7);
        let msg = WireMessage::RoomText {
            text: RoomText {
                room_id: Uuid::new_v4(),
                author,
                text: "x".into(),
            },
            clock: VectorClock::new(),
            ack_id: Uuid::new_v4(),
        };
        assert_eq!(msg.sender_id(), author);

        let ping = WireMessage::Ping { peer: peer(4) };
        assert_eq!(ping.sender_id(), Uuid::from_u128(4));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(WireMessage::decode(&[0xFF, 0xFE, 0xFD, 0xFC]).is_err());
        assert!(WireMessage::decode(&[]).is_err());
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let msg = WireMessage::RoomMembership {
            sender: Uuid::from_u128(1),
            room: RoomDesc::new("lounge", group(), vec![peer(1), peer(2)]),
            ack_id: Uuid::new_v4(),
        };
        let encoded = msg.encode().unwrap();
        assert!(WireMessage::decode(&encoded[..encoded.len() / 2]).is_err());
    }

    #[test]
    fn test_typical_text_fits_lan_target() {
        let msg = WireMessage::RoomText {
            text: RoomText {
                room_id: Uuid::new_v4(),
                author: Uuid::from_u128(1),
                text: "a reasonably long chat line that still fits one frame".into(),
            },
            clock: VectorClock::from_ids((0..8).map(Uuid::from_u128)),
            ack_id: Uuid::new_v4(),
        };
        assert!(msg.encode().unwrap().len() <= TARGET_DATAGRAM_LEN);
    }

    #[test]
    fn test_oversize_is_rejected() {
        let msg = WireMessage::RoomText {
            text: RoomText {
                room_id: Uuid::new_v4(),
                author: Uuid::from_u128(1),
                text: "x".repeat(MAX_DATAGRAM_LEN),
            },
            clock: VectorClock::new(),
            ack_id: Uuid::new_v4(),
        };
        assert!(matches!(msg.encode(), Err(WireError::Oversize(_))));
    }
}
