//! The coordinator: single owner of all node state.
//!
//! Listeners, retransmission timers and the shell never touch state:
//! they post [`Event`]s into one channel and the coordinator task drains
//! it one event at a time. That single-consumer discipline is the whole
//! concurrency story; no state here needs a lock.
//!
//! ```text
//! unicast listener ──┐
//! multicast listeners ─┤                        ┌── Sender ──► UDP
//! resend timers ──────┼──► mpsc ──► Coordinator ┤
//! shell commands ─────┘                         └── NodeEvent ──► shell
//! ```

use crate::ack::{AckTable, CompletedMulticast};
use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::event::{Command, Event, NodeEvent, NotifyLevel, RoomLists, RoomView};
use crate::listener;
use crate::net;
use crate::registry::PeerRegistry;
use crate::room::{Causality, Room, RoomRegistry, RoomSide};
use crate::sender::Sender;
use agora_proto::{Peer, RoomDesc, RoomText, VectorClock, WireMessage};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Handle to a running chat node.
///
/// Methods enqueue a command for the coordinator task and await its reply;
/// they can be called from any task. Dropping every handle shuts the
/// coordinator down ungracefully; [`Node::shutdown`] is the polite exit
/// that announces the departure.
pub struct Node {
    local: Peer,
    events_tx: mpsc::Sender<Event>,
    node_events: Option<mpsc::Receiver<NodeEvent>>,
}

impl Node {
    /// Resolve the local interface, bind the unicast socket and start the
    /// coordinator and listener tasks.
    pub async fn start(config: NodeConfig) -> Result<Node> {
        let ip = net::local_ip(config.probe_addr)?;
        let socket = Arc::new(net::bind_unicast(
            config.unicast_port,
            config.multicast_interface,
        )?);
        let port = socket.local_addr()?.port();
        let local = Peer::new(config.username.clone(), SocketAddr::new(ip, port));
        log::info!("node {} listening on {}", local.username, local.addr);

        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        let (ui_tx, ui_rx) = mpsc::channel(config.event_capacity);

        let unicast_task = listener::spawn_unicast(socket.clone(), local.addr, events_tx.clone());
        let broadcast = config
            .broadcast_addr
            .unwrap_or_else(|| net::broadcast_addr(config.unicast_port));

        let coordinator = Coordinator {
            local: local.clone(),
            broadcast,
            sender: Sender::new(socket),
            peers: PeerRegistry::new(local.id),
            rooms: RoomRegistry::new(),
            acks: AckTable::new(config.resend_interval),
            displayed: None,
            groups: HashMap::new(),
            events_tx: events_tx.clone(),
            ui: ui_tx,
            unicast_task,
            shutdown_reply: None,
            config,
        };
        tokio::spawn(coordinator.run(events_rx));

        Ok(Node {
            local,
            events_tx,
            node_events: Some(ui_rx),
        })
    }

    /// The identity this node announces to the network.
    pub fn local_peer(&self) -> &Peer {
        &self.local
    }

    /// Take the event receiver (can only be called once).
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<NodeEvent>> {
        self.node_events.take()
    }

    /// Broadcast a discovery ping.
    pub async fn discover(&self) -> Result<()> {
        self.command(|reply| Command::Discover { reply }).await?
    }

    /// Create a room from self plus the peers at the given 1-based
    /// indexes of the discovered-peer listing.
    pub async fn create_room(
        &self,
        name: impl Into<String>,
        member_indexes: Vec<usize>,
    ) -> Result<RoomDesc> {
        let name = name.into();
        self.command(|reply| Command::CreateRoom {
            name,
            member_indexes,
            reply,
        })
        .await?
    }

    /// Open a room for display; returns its descriptor and history.
    pub async fn enter_room(&self, name: impl Into<String>) -> Result<RoomView> {
        let name = name.into();
        self.command(|reply| Command::EnterRoom { name, reply }).await?
    }

    /// Send a chat line into the currently displayed room.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.command(|reply| Command::SendText { text, reply }).await?
    }

    /// Delete a room this node created, notifying its members.
    pub async fn delete_room(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.command(|reply| Command::DeleteRoom { name, reply }).await?
    }

    /// Stop displaying a room (membership is unaffected).
    pub async fn leave_room(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.command(|reply| Command::LeaveRoom { name, reply }).await?
    }

    /// Discovered peers, in listing order.
    pub async fn peers(&self) -> Result<Vec<Peer>> {
        self.command(|reply| Command::ListPeers { reply }).await
    }

    /// Both room sets.
    pub async fn rooms(&self) -> Result<RoomLists> {
        self.command(|reply| Command::ListRooms { reply }).await
    }

    /// The currently displayed room, if any.
    pub async fn current_room(&self) -> Result<Option<RoomDesc>> {
        self.command(|reply| Command::CurrentRoom { reply }).await
    }

    /// Announce departure to every known peer, wait (bounded) for their
    /// acks, then stop the node.
    pub async fn shutdown(&self) -> Result<()> {
        self.command(|reply| Command::Shutdown { reply }).await?
    }

    async fn command<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.events_tx
            .send(Event::Command(build(tx)))
            .await
            .map_err(|_| NodeError::Closed)?;
        rx.await.map_err(|_| NodeError::Closed)
    }
}

/// The state machine behind a [`Node`].
struct Coordinator {
    config: NodeConfig,
    local: Peer,
    broadcast: SocketAddr,
    sender: Sender,
    peers: PeerRegistry,
    rooms: RoomRegistry,
    acks: AckTable,
    /// Room currently shown by the shell. Every handler that removes a
    /// room clears this when it pointed there.
    displayed: Option<Uuid>,
    /// Multicast listener task per joined room.
    groups: HashMap<Uuid, JoinHandle<()>>,
    events_tx: mpsc::Sender<Event>,
    ui: mpsc::Sender<NodeEvent>,
    unicast_task: JoinHandle<()>,
    shutdown_reply: Option<oneshot::Sender<Result<()>>>,
}

impl Coordinator {
    async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            match event {
                Event::Wire { msg, src } => {
                    if let Err(e) = self.on_wire(msg, src).await {
                        log::warn!("handler failed: {e}");
                    }
                }
                Event::ResendUnicast(ack_id) => {
                    self.acks.resend_unicast(ack_id, &self.sender).await
                }
                Event::ResendMulticast(ack_id) => {
                    self.acks.resend_multicast(ack_id, &self.sender).await
                }
                Event::ShutdownComplete => {
                    if let Some(reply) = self.shutdown_reply.take() {
                        let _ = reply.send(Ok(()));
                    }
                    break;
                }
                Event::Command(command) => {
                    if self.on_command(command).await {
                        break;
                    }
                }
            }
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.unicast_task.abort();
        for (_, task) in self.groups.drain() {
            task.abort();
        }
        self.acks.clear();
        log::info!("node {} stopped", self.local.username);
    }

    // ─── incoming messages ──────────────────────────────────────────────

    async fn on_wire(&mut self, msg: WireMessage, _src: SocketAddr) -> Result<()> {
        match msg {
            WireMessage::Ping { peer } => self.on_ping(peer).await,
            WireMessage::Pong { peer } => {
                self.peer_found(peer);
                Ok(())
            }
            WireMessage::RoomMembership {
                sender,
                room,
                ack_id,
            } => self.on_room_membership(sender, room, ack_id).await,
            WireMessage::DeleteRoom {
                sender,
                room_id,
                ack_id,
            } => self.on_delete_room(sender, room_id, ack_id).await,
            WireMessage::RoomText {
                text,
                clock,
                ack_id,
            } => self.on_room_text(text, clock, ack_id).await,
            WireMessage::LeaveNetwork { peer, ack_id } => {
                self.on_leave_network(peer, ack_id).await
            }
            WireMessage::AckUnicast { sender, ack_id } => {
                let from = self.peers.get(sender).map(|p| p.addr);
                self.acks.on_ack_unicast(ack_id, from);
                Ok(())
            }
            WireMessage::AckMulticast { sender, ack_id } => {
                if let Some(completed) = self.acks.on_ack_multicast(ack_id, sender) {
                    self.cleanup_completed(completed);
                }
                Ok(())
            }
        }
    }

    async fn on_ping(&mut self, peer: Peer) -> Result<()> {
        if peer.id == self.local.id {
            return Ok(());
        }
        let pong = WireMessage::Pong {
            peer: self.local.clone(),
        };
        self.sender.send(&pong, peer.addr).await?;
        self.peer_found(peer);
        Ok(())
    }

    async fn on_room_membership(
        &mut self,
        sender: Uuid,
        room: RoomDesc,
        ack_id: Uuid,
    ) -> Result<()> {
        let dest = self.ack_dest(Some(&room), sender);
        let ack = WireMessage::AckUnicast {
            sender: self.local.id,
            ack_id,
        };
        self.sender.send(&ack, dest).await?;

        if self.rooms.contains(room.id) {
            return Ok(());
        }

        // members we had not discovered yet become known peers
        for member in room.others(self.local.id) {
            self.peers.add(member.clone());
        }

        self.join_room_group(&room)?;
        self.notify(
            NotifyLevel::Success,
            format!("you have been added to the room '{}'", room.name),
        );
        self.rooms.insert_participating(Room::new(room));
        Ok(())
    }

    async fn on_room_text(
        &mut self,
        text: RoomText,
        clock: VectorClock,
        ack_id: Uuid,
    ) -> Result<()> {
        // texts for rooms we do not know are dropped without an ack
        let dest = match self.rooms.get(text.room_id) {
            Some(room) => self.ack_dest(Some(&room.desc), text.author),
            None => return Ok(()),
        };
        let ack = WireMessage::AckMulticast {
            sender: self.local.id,
            ack_id,
        };
        self.sender.send(&ack, dest).await?;

        let local_id = self.local.id;
        let author = text.author;
        let room = self.rooms.get_mut(text.room_id).expect("room checked above");
        match room.evaluate(local_id, author, &clock) {
            Causality::Accepted => {
                room.apply(text.clone(), &clock);
                let mut delivered = vec![text];
                delivered.extend(room.drain_ready(local_id));
                for line in delivered {
                    self.emit_text(&line);
                }
            }
            Causality::Queued => room.defer(text, clock),
            Causality::Discarded => {}
        }
        Ok(())
    }

    async fn on_delete_room(&mut self, sender: Uuid, room_id: Uuid, ack_id: Uuid) -> Result<()> {
        // only a participant reacts; the creator removed its copy already
        if self.rooms.side(room_id) != Some(RoomSide::Participating) {
            return Ok(());
        }
        let (dest, group) = {
            let room = self.rooms.get(room_id).expect("side checked above");
            (self.ack_dest(Some(&room.desc), sender), room.desc.group)
        };
        let ack = WireMessage::AckMulticast {
            sender: self.local.id,
            ack_id,
        };
        self.sender.send(&ack, dest).await?;

        self.acks.drop_group(group);
        let (_, room) = self.rooms.remove(room_id).expect("room present");
        if let Some(task) = self.groups.remove(&room_id) {
            task.abort();
        }
        if self.displayed == Some(room_id) {
            self.displayed = None;
        }
        self.notify(
            NotifyLevel::Info,
            format!("the room '{}' has been deleted", room.desc.name),
        );
        Ok(())
    }

    async fn on_leave_network(&mut self, peer: Peer, ack_id: Uuid) -> Result<()> {
        let dest = self.peers.get(peer.id).map(|p| p.addr).unwrap_or(peer.addr);
        let ack = WireMessage::AckUnicast {
            sender: self.local.id,
            ack_id,
        };
        self.sender.send(&ack, dest).await?;

        // every room the peer was in dies with it
        for room_id in self.rooms.rooms_with_member(peer.id) {
            let (_, room) = self.rooms.remove(room_id).expect("room present");
            if let Some(task) = self.groups.remove(&room_id) {
                task.abort();
            }
            if self.displayed == Some(room_id) {
                self.displayed = None;
            }
            self.notify(
                NotifyLevel::Info,
                format!(
                    "the room '{}' has been deleted because {} left the network",
                    room.desc.name, peer.username
                ),
            );
        }

        let completed = self.acks.peer_departed(peer.id, peer.addr);
        for done in completed {
            self.cleanup_completed(done);
        }
        self.peers.remove(peer.id);
        Ok(())
    }

    // ─── shell commands ─────────────────────────────────────────────────

    /// Returns true when the node should stop.
    async fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::Discover { reply } => {
                let ping = WireMessage::Ping {
                    peer: self.local.clone(),
                };
                let sent = self.sender.send(&ping, self.broadcast).await;
                let _ = reply.send(sent);
            }
            Command::CreateRoom {
                name,
                member_indexes,
                reply,
            } => {
                let result = self.create_room(name, member_indexes).await;
                let _ = reply.send(result);
            }
            Command::EnterRoom { name, reply } => {
                let result = self.enter_room(&name);
                let _ = reply.send(result);
            }
            Command::SendText { text, reply } => {
                let result = self.send_text(text).await;
                let _ = reply.send(result);
            }
            Command::DeleteRoom { name, reply } => {
                let result = self.delete_created_room(&name).await;
                let _ = reply.send(result);
            }
            Command::LeaveRoom { name, reply } => {
                let result = self.leave_room(&name);
                let _ = reply.send(result);
            }
            Command::ListPeers { reply } => {
                let _ = reply.send(self.peers.list());
            }
            Command::ListRooms { reply } => {
                let _ = reply.send(RoomLists {
                    created: self.rooms.created().map(|r| r.desc.clone()).collect(),
                    participating: self.rooms.participating().map(|r| r.desc.clone()).collect(),
                });
            }
            Command::CurrentRoom { reply } => {
                let current = self.displayed.and_then(|id| self.rooms.get(id));
                let _ = reply.send(current.map(|r| r.desc.clone()));
            }
            Command::Shutdown { reply } => return self.begin_shutdown(reply).await,
        }
        false
    }

    async fn create_room(&mut self, name: String, member_indexes: Vec<usize>) -> Result<RoomDesc> {
        let listing = self.peers.list();
        let mut ids = HashSet::new();
        let mut members = vec![self.local.clone()];
        for index in member_indexes {
            let peer = index
                .checked_sub(1)
                .and_then(|i| listing.get(i))
                .ok_or_else(|| {
                    NodeError::InvalidParameter(format!("there is no peer number {index}"))
                })?;
            if ids.insert(peer.id) {
                members.push(peer.clone());
            }
        }
        if members.len() < 2 {
            return Err(NodeError::EmptyRoom);
        }

        let desc = RoomDesc::new(
            name,
            net::random_group(self.config.multicast_port),
            members,
        );
        self.join_room_group(&desc)?;

        // one shared ack id: any member's ack shrinks the same list
        let ack_id = Uuid::new_v4();
        let outstanding: Vec<(WireMessage, SocketAddr)> = desc
            .others(self.local.id)
            .map(|member| {
                let msg = WireMessage::RoomMembership {
                    sender: self.local.id,
                    room: desc.clone(),
                    ack_id,
                };
                (msg, member.addr)
            })
            .collect();
        self.acks
            .track_unicast(ack_id, outstanding.clone(), None, &self.events_tx);
        self.rooms.insert_created(Room::new(desc.clone()));

        for (msg, dest) in &outstanding {
            if let Err(e) = self.sender.send(msg, *dest).await {
                log::warn!("membership send to {dest} failed (will retransmit): {e}");
            }
        }
        log::info!("created room '{}' with {} members", desc.name, desc.members.len());
        Ok(desc)
    }

    fn enter_room(&mut self, name: &str) -> Result<RoomView> {
        let view = {
            let room = self.rooms.by_name(name)?;
            let messages = room
                .history()
                .iter()
                .map(|line| (self.author_name(&room.desc, line.author), line.text.clone()))
                .collect();
            RoomView {
                desc: room.desc.clone(),
                messages,
            }
        };
        self.displayed = Some(view.desc.id);
        Ok(view)
    }

    fn leave_room(&mut self, name: &str) -> Result<()> {
        let room_id = self.rooms.by_name(name)?.desc.id;
        if self.displayed != Some(room_id) {
            return Err(NodeError::InvalidParameter(format!(
                "the room '{name}' is not open"
            )));
        }
        self.displayed = None;
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<()> {
        let room_id = self
            .displayed
            .ok_or_else(|| NodeError::InvalidParameter("no room is open".into()))?;
        let local_id = self.local.id;
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| NodeError::InvalidParameter("the open room no longer exists".into()))?;

        let line = RoomText {
            room_id,
            author: local_id,
            text,
        };
        let snapshot = room.apply_local(local_id, line.clone());
        let ack_id = Uuid::new_v4();
        let msg = WireMessage::RoomText {
            text: line.clone(),
            clock: snapshot,
            ack_id,
        };
        let group = room.desc.group;
        let pending: HashSet<Uuid> = room.desc.others(local_id).map(|p| p.id).collect();
        self.acks
            .track_multicast(ack_id, msg.clone(), group, room_id, pending, &self.events_tx);

        if let Err(e) = self.sender.send(&msg, group).await {
            log::warn!("text send to {group} failed (will retransmit): {e}");
        }
        self.emit_text(&line);
        Ok(())
    }

    async fn delete_created_room(&mut self, name: &str) -> Result<()> {
        let room_id = self.rooms.created_by_name(name)?.desc.id;
        let (_, room) = self.rooms.remove(room_id).expect("room present");
        let desc = room.desc;

        // sweep lists still aimed at the group before installing the
        // deletion's own list
        self.acks.drop_group(desc.group);

        let ack_id = Uuid::new_v4();
        let msg = WireMessage::DeleteRoom {
            sender: self.local.id,
            room_id: desc.id,
            ack_id,
        };
        let pending: HashSet<Uuid> = desc.others(self.local.id).map(|p| p.id).collect();
        if pending.is_empty() {
            if let Some(task) = self.groups.remove(&desc.id) {
                task.abort();
            }
        } else {
            // the group listener stays up until every member acked
            self.acks
                .track_multicast(ack_id, msg.clone(), desc.group, desc.id, pending, &self.events_tx);
        }

        if let Err(e) = self.sender.send(&msg, desc.group).await {
            log::warn!("delete send to {} failed (will retransmit): {e}", desc.group);
        }
        if self.displayed == Some(desc.id) {
            self.displayed = None;
        }
        log::info!("deleted room '{}'", desc.name);
        Ok(())
    }

    async fn begin_shutdown(&mut self, reply: oneshot::Sender<Result<()>>) -> bool {
        if self.shutdown_reply.is_some() {
            let _ = reply.send(Err(NodeError::Closed));
            return false;
        }

        let ack_id = Uuid::new_v4();
        let outstanding: Vec<(WireMessage, SocketAddr)> = self
            .peers
            .iter()
            .map(|peer| {
                let msg = WireMessage::LeaveNetwork {
                    peer: self.local.clone(),
                    ack_id,
                };
                (msg, peer.addr)
            })
            .collect();

        if outstanding.is_empty() {
            let _ = reply.send(Ok(()));
            return true;
        }

        for (msg, dest) in &outstanding {
            if let Err(e) = self.sender.send(msg, *dest).await {
                log::warn!("leave send to {dest} failed (will retransmit): {e}");
            }
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.acks
            .track_unicast(ack_id, outstanding, Some(done_tx), &self.events_tx);
        self.shutdown_reply = Some(reply);

        // wait off-loop for the acks so their events keep being processed
        let events = self.events_tx.clone();
        let deadline = self.config.shutdown_timeout;
        tokio::spawn(async move {
            if tokio::time::timeout(deadline, done_rx).await.is_err() {
                log::warn!("departure acks incomplete after {deadline:?}, leaving anyway");
            }
            let _ = events.send(Event::ShutdownComplete).await;
        });
        false
    }

    // ─── helpers ────────────────────────────────────────────────────────

    fn peer_found(&mut self, peer: Peer) {
        let username = peer.username.clone();
        if self.peers.add(peer) {
            log::info!("discovered peer {username}");
            self.notify(NotifyLevel::Info, format!("discovered peer {username}"));
        }
    }

    /// Where to send an ack: the sender's entry in the room, then the
    /// registry, then the broadcast address as a last resort.
    fn ack_dest(&self, room: Option<&RoomDesc>, sender: Uuid) -> SocketAddr {
        room.and_then(|desc| desc.member(sender))
            .map(|peer| peer.addr)
            .or_else(|| self.peers.get(sender).map(|peer| peer.addr))
            .unwrap_or(self.broadcast)
    }

    fn join_room_group(&mut self, desc: &RoomDesc) -> Result<()> {
        let socket = net::join_group(desc.group, self.config.multicast_interface)?;
        let task = listener::spawn_multicast(socket, self.local.id, self.events_tx.clone());
        self.groups.insert(desc.id, task);
        Ok(())
    }

    /// A completed multicast list may have been the only reason a deleted
    /// room's listener was still alive.
    fn cleanup_completed(&mut self, completed: CompletedMulticast) {
        if !self.rooms.contains(completed.room_id) {
            if let Some(task) = self.groups.remove(&completed.room_id) {
                task.abort();
            }
        }
    }

    fn emit_text(&self, line: &RoomText) {
        if self.displayed != Some(line.room_id) {
            return;
        }
        let Some(room) = self.rooms.get(line.room_id) else {
            return;
        };
        let _ = self.ui.try_send(NodeEvent::TextDelivered {
            room: room.desc.name.clone(),
            author: self.author_name(&room.desc, line.author),
            text: line.text.clone(),
        });
    }

    fn author_name(&self, desc: &RoomDesc, author: Uuid) -> String {
        desc.member(author)
            .map(|peer| peer.username.clone())
            .unwrap_or_else(|| author.to_string())
    }

    fn notify(&self, level: NotifyLevel, text: impl Into<String>) {
        let _ = self.ui.try_send(NodeEvent::Notification {
            level,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(username: &str) -> NodeConfig {
        NodeConfig {
            username: username.into(),
            unicast_port: 0,
            probe_addr: "127.0.0.1:9".parse().unwrap(),
            // nobody listens here; discovery in unit tests goes nowhere
            broadcast_addr: Some("127.0.0.1:1".parse().unwrap()),
            resend_interval: Duration::from_millis(50),
            shutdown_timeout: Duration::from_millis(500),
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_resolves_loopback_identity() {
        let node = Node::start(test_config("alice")).await.unwrap();
        assert!(node.local_peer().addr.ip().is_loopback());
        assert_ne!(node.local_peer().addr.port(), 0);
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_take_events_is_single_take() {
        let mut node = Node::start(test_config("alice")).await.unwrap();
        assert!(node.take_events().is_some());
        assert!(node.take_events().is_none());
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_room_needs_members() {
        let node = Node::start(test_config("alice")).await.unwrap();
        assert!(matches!(
            node.create_room("lounge", vec![]).await,
            Err(NodeError::EmptyRoom)
        ));
        assert!(matches!(
            node.create_room("lounge", vec![7]).await,
            Err(NodeError::InvalidParameter(_))
        ));
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_text_requires_open_room() {
        let node = Node::start(test_config("alice")).await.unwrap();
        assert!(matches!(
            node.send_text("hello").await,
            Err(NodeError::InvalidParameter(_))
        ));
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_without_peers_is_immediate() {
        let node = Node::start(test_config("alice")).await.unwrap();
        node.shutdown().await.unwrap();
        // the coordinator is gone; further commands fail cleanly
        assert!(matches!(node.peers().await, Err(NodeError::Closed)));
    }
}
