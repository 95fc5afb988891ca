//! Events flowing through the node.
//!
//! Listeners, retransmission timers and the shell all talk to the
//! coordinator through one mpsc channel carrying [`Event`]s, so state is
//! only ever touched by the single coordinator task. The coordinator talks
//! back to the shell through [`NodeEvent`]s.

use crate::error::Result;
use agora_proto::{Peer, RoomDesc, WireMessage};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Everything the coordinator task can be woken by.
#[derive(Debug)]
pub enum Event {
    /// A decoded datagram from one of the listeners.
    Wire { msg: WireMessage, src: SocketAddr },
    /// A unicast ack waiting list's retransmission tick.
    ResendUnicast(Uuid),
    /// A multicast ack waiting list's retransmission tick.
    ResendMulticast(Uuid),
    /// The departure announcement was acked by everyone (or timed out).
    ShutdownComplete,
    /// A user intent from the shell.
    Command(Command),
}

/// User intents, each carrying its reply channel.
#[derive(Debug)]
pub enum Command {
    Discover {
        reply: oneshot::Sender<Result<()>>,
    },
    CreateRoom {
        name: String,
        /// 1-based indexes into the discovered-peer listing.
        member_indexes: Vec<usize>,
        reply: oneshot::Sender<Result<RoomDesc>>,
    },
    EnterRoom {
        name: String,
        reply: oneshot::Sender<Result<RoomView>>,
    },
    SendText {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    DeleteRoom {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    LeaveRoom {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ListPeers {
        reply: oneshot::Sender<Vec<Peer>>,
    },
    ListRooms {
        reply: oneshot::Sender<RoomLists>,
    },
    CurrentRoom {
        reply: oneshot::Sender<Option<RoomDesc>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Snapshot of both room sets.
#[derive(Debug, Clone, Default)]
pub struct RoomLists {
    pub created: Vec<RoomDesc>,
    pub participating: Vec<RoomDesc>,
}

/// A room opened for display: its descriptor plus the chat history as
/// `(author username, text)` lines.
#[derive(Debug, Clone)]
pub struct RoomView {
    pub desc: RoomDesc,
    pub messages: Vec<(String, String)>,
}

/// Events emitted toward the shell.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// Something the user should see.
    Notification { level: NotifyLevel, text: String },
    /// A chat line delivered in the currently displayed room.
    TextDelivered {
        room: String,
        author: String,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}
