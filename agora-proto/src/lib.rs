//! # agora-proto — wire protocol for the agora LAN group chat
//!
//! Everything that crosses the network lives here: peer identity, the
//! vector clock carried by room texts, the room descriptor shipped to new
//! members, and the tagged datagram codec.
//!
//! ```text
//! ┌───────────┐  encode   ┌──────────────┐  one UDP datagram  ┌───────────┐
//! │WireMessage│ ────────► │ bincode bytes │ ─────────────────► │ listener  │
//! └───────────┘           └──────────────┘       ≤ 65 507 B    └─────┬─────┘
//!                                                                    │ decode
//!                                                                    ▼
//!                                                              WireMessage
//! ```
//!
//! ## Modules
//!
//! - [`peer`] — peer identity (uuid, username, unicast address)
//! - [`clock`] — vector clocks for causal ordering
//! - [`room`] — room descriptor and chat text payload
//! - [`wire`] — the eight-message datagram codec

pub mod clock;
pub mod peer;
pub mod room;
pub mod wire;

pub use clock::VectorClock;
pub use peer::Peer;
pub use room::{RoomDesc, RoomText};
pub use wire::{WireError, WireMessage, MAX_DATAGRAM_LEN, TARGET_DATAGRAM_LEN};
