//! Ack waiting lists: at-least-once delivery bookkeeping.
//!
//! Every message that requires confirmation gets a waiting list keyed by
//! its ack id. A unicast list tracks one `(message, destination)` pair per
//! recipient; a multicast list tracks one message and the set of peers
//! still owing an ack. Each list runs a constant-period timer task that
//! posts a resend event into the coordinator channel; the coordinator
//! re-emits through the [`Sender`](crate::sender::Sender). There is no
//! backoff: LAN latencies are assumed, and a list only dies by
//! completing, by peer-departure fixup, or by room deletion.

use crate::event::Event;
use crate::sender::Sender;
use agora_proto::WireMessage;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Pending unicast replies for one ack id.
struct UnicastAckList {
    outstanding: Vec<(WireMessage, SocketAddr)>,
    timer: JoinHandle<()>,
    /// Fired once when the last outstanding entry is acked; shutdown
    /// waits on this for the departure announcement.
    done: Option<oneshot::Sender<()>>,
}

impl Drop for UnicastAckList {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Pending multicast acks for one ack id.
struct MulticastAckList {
    message: WireMessage,
    group: SocketAddr,
    room_id: Uuid,
    pending: HashSet<Uuid>,
    timer: JoinHandle<()>,
}

impl Drop for MulticastAckList {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// A multicast list that just completed; the coordinator uses the room id
/// to tear down listeners kept alive only for the list's sake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedMulticast {
    pub room_id: Uuid,
    pub group: SocketAddr,
}

/// Both waiting-list maps plus their shared resend period.
pub struct AckTable {
    uni: HashMap<Uuid, UnicastAckList>,
    multi: HashMap<Uuid, MulticastAckList>,
    resend_interval: Duration,
}

impl AckTable {
    pub fn new(resend_interval: Duration) -> Self {
        Self {
            uni: HashMap::new(),
            multi: HashMap::new(),
            resend_interval,
        }
    }

    /// Start tracking a batch of unicast messages under one ack id.
    ///
    /// An empty batch completes on the spot: `done` fires and nothing is
    /// tracked.
    pub fn track_unicast(
        &mut self,
        ack_id: Uuid,
        outstanding: Vec<(WireMessage, SocketAddr)>,
        done: Option<oneshot::Sender<()>>,
        events: &mpsc::Sender<Event>,
    ) {
        if outstanding.is_empty() {
            if let Some(done) = done {
                let _ = done.send(());
            }
            return;
        }
        let timer =
            spawn_resend_timer(self.resend_interval, events.clone(), ack_id, Event::ResendUnicast);
        self.uni.insert(
            ack_id,
            UnicastAckList {
                outstanding,
                timer,
                done,
            },
        );
    }

    /// Start tracking one multicast message until every peer in `pending`
    /// acks it.
    pub fn track_multicast(
        &mut self,
        ack_id: Uuid,
        message: WireMessage,
        group: SocketAddr,
        room_id: Uuid,
        pending: HashSet<Uuid>,
        events: &mpsc::Sender<Event>,
    ) {
        if pending.is_empty() {
            return;
        }
        let timer = spawn_resend_timer(
            self.resend_interval,
            events.clone(),
            ack_id,
            Event::ResendMulticast,
        );
        self.multi.insert(
            ack_id,
            MulticastAckList {
                message,
                group,
                room_id,
                pending,
                timer,
            },
        );
    }

    /// Re-emit every outstanding entry of a unicast list. A tick for a
    /// list that already completed is stale and ignored.
    pub async fn resend_unicast(&self, ack_id: Uuid, sender: &Sender) {
        let Some(list) = self.uni.get(&ack_id) else {
            return;
        };
        log::debug!(
            "resending {} unacked unicast message(s) for {ack_id}",
            list.outstanding.len()
        );
        for (msg, dest) in &list.outstanding {
            if let Err(e) = sender.send(msg, *dest).await {
                log::warn!("resend to {dest} failed: {e}");
            }
        }
    }

    /// Re-emit a multicast list's message to its group.
    pub async fn resend_multicast(&self, ack_id: Uuid, sender: &Sender) {
        let Some(list) = self.multi.get(&ack_id) else {
            return;
        };
        log::debug!(
            "resending multicast message for {ack_id} ({} peer(s) pending)",
            list.pending.len()
        );
        if let Err(e) = sender.send(&list.message, list.group).await {
            log::warn!("resend to group {} failed: {e}", list.group);
        }
    }

    /// An ACK_UNI arrived: drop the entries addressed to the acking peer.
    /// Returns true when this completed the list.
    pub fn on_ack_unicast(&mut self, ack_id: Uuid, from: Option<SocketAddr>) -> bool {
        let Some(from) = from else {
            // sender not resolvable: nothing to match the entries against
            return false;
        };
        let Some(list) = self.uni.get_mut(&ack_id) else {
            return false;
        };
        list.outstanding.retain(|(_, dest)| *dest != from);
        if list.outstanding.is_empty() {
            let mut list = self.uni.remove(&ack_id).expect("list present");
            if let Some(done) = list.done.take() {
                let _ = done.send(());
            }
            log::debug!("unicast waiting list {ack_id} complete");
            return true;
        }
        false
    }

    /// An ACK_MULTI arrived: remove the acking peer from the pending set.
    pub fn on_ack_multicast(&mut self, ack_id: Uuid, peer: Uuid) -> Option<CompletedMulticast> {
        let list = self.multi.get_mut(&ack_id)?;
        list.pending.remove(&peer);
        if list.pending.is_empty() {
            let list = self.multi.remove(&ack_id).expect("list present");
            log::debug!("multicast waiting list {ack_id} complete");
            return Some(CompletedMulticast {
                room_id: list.room_id,
                group: list.group,
            });
        }
        None
    }

    /// A peer left the network: stop expecting anything from it.
    ///
    /// Multicast lists drop the peer from their pending sets; unicast
    /// lists drop only the entries addressed to it. Lists that empty out
    /// complete naturally. Collect first, mutate after, never while
    /// iterating.
    pub fn peer_departed(&mut self, peer: Uuid, addr: SocketAddr) -> Vec<CompletedMulticast> {
        let mut completed = Vec::new();

        let emptied: Vec<Uuid> = self
            .multi
            .iter_mut()
            .filter_map(|(id, list)| {
                list.pending.remove(&peer);
                list.pending.is_empty().then_some(*id)
            })
            .collect();
        for id in emptied {
            let list = self.multi.remove(&id).expect("list present");
            completed.push(CompletedMulticast {
                room_id: list.room_id,
                group: list.group,
            });
        }

        let emptied: Vec<Uuid> = self
            .uni
            .iter_mut()
            .filter_map(|(id, list)| {
                list.outstanding.retain(|(_, dest)| *dest != addr);
                list.outstanding.is_empty().then_some(*id)
            })
            .collect();
        for id in emptied {
            let mut list = self.uni.remove(&id).expect("list present");
            if let Some(done) = list.done.take() {
                let _ = done.send(());
            }
        }

        completed
    }

    /// A room is gone: discard every multicast list aimed at its group.
    pub fn drop_group(&mut self, group: SocketAddr) {
        self.multi.retain(|_, list| list.group != group);
    }

    /// Drop everything (timers abort on drop).
    pub fn clear(&mut self) {
        self.uni.clear();
        self.multi.clear();
    }

    pub fn unicast_len(&self) -> usize {
        self.uni.len()
    }

    pub fn multicast_len(&self) -> usize {
        self.multi.len()
    }
}

/// Periodic resend trigger. The first tick fires one full period after
/// the initial send, not immediately.
fn spawn_resend_timer(
    period: Duration,
    events: mpsc::Sender<Event>,
    ack_id: Uuid,
    make: fn(Uuid) -> Event,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tick.tick().await; // consume the immediate first tick
        loop {
            tick.tick().await;
            if events.send(make(ack_id)).await.is_err() {
                break;
            }
        }
    })
}
