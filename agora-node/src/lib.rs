//! # agora-node — coordination core of the agora LAN group chat
//!
//! Serverless group chat over a LAN: peers find each other by broadcast,
//! form named rooms on ad-hoc multicast groups, and exchange texts with
//! causal delivery and at-least-once reliability on top of plain UDP.
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────┐ PING / PONG ┌──────────────┐
//!            │    node A    │ ◄─────────► │    node B    │
//!            └──────┬───────┘  broadcast  └──────┬───────┘
//!                   │                            │
//!                   │  ROOM_TEXT + vector clock  │
//!                   └──────► 239.x.x.x ◄─────────┘
//!                        (room multicast group)
//! ```
//!
//! Inside a node, one coordinator task owns every piece of state and
//! drains a single event channel; listeners decode and forward, timers
//! tick, the shell enqueues commands. Nothing else mutates anything.
//!
//! ## Modules
//!
//! - [`coordinator`] — the event loop and the [`Node`] handle
//! - [`room`] — room state, causal delivery, deferral queue
//! - [`ack`] — ack waiting lists and retransmission
//! - [`registry`] — discovered peers
//! - [`sender`] / [`listener`] — the UDP send and receive paths
//! - [`net`] — interface discovery and multicast group plumbing
//! - [`config`] / [`event`] / [`error`] — surface types

pub mod ack;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod listener;
pub mod net;
pub mod registry;
pub mod room;
pub mod sender;

pub use config::NodeConfig;
pub use coordinator::Node;
pub use error::{NodeError, Result};
pub use event::{NodeEvent, NotifyLevel, RoomLists, RoomView};
