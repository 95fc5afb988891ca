//! Room state, causal delivery decisions and the deferral queue.
//!
//! A room owns one vector clock and a FIFO of texts whose causal
//! dependencies have not arrived yet. Every incoming text is classified
//! against the room clock:
//!
//! ```text
//!             incoming clock M vs room clock R
//!   M ≤ R ──────────────────────────────► Discarded (old / duplicate)
//!   M ∥ R, slice-sum gap ≤ 1 ───────────► Accepted  (truly concurrent)
//!   M ∥ R, gap > 1 ──────────────────────► Queued   (wait for fill-in)
//!   R < M, author's next + no gaps ─────► Accepted
//!   R < M, otherwise ───────────────────► Queued
//! ```
//!
//! Reference: Kleppmann, Chapter 9 — Ordering Guarantees

use crate::error::{NodeError, Result};
use agora_proto::{RoomDesc, RoomText, VectorClock};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Outcome of the causal delivery decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    Accepted,
    Queued,
    Discarded,
}

/// A received text still waiting for its causal dependencies.
#[derive(Debug, Clone)]
pub struct PendingText {
    pub text: RoomText,
    pub clock: VectorClock,
}

/// One room as this node sees it.
#[derive(Debug)]
pub struct Room {
    pub desc: RoomDesc,
    pub clock: VectorClock,
    history: Vec<RoomText>,
    deferred: VecDeque<PendingText>,
}

impl Room {
    /// Build the local state for a room, seeding the clock with every
    /// member at 0.
    pub fn new(desc: RoomDesc) -> Self {
        let clock = VectorClock::from_ids(desc.member_ids());
        Self {
            desc,
            clock,
            history: Vec::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn history(&self) -> &[RoomText] {
        &self.history
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Classify an incoming text's clock snapshot against the room clock.
    ///
    /// `local_id` is excluded from the concurrency slice: the local
    /// coordinate only advances through our own sends, so it says nothing
    /// about what two remote authors had seen.
    pub fn evaluate(&self, local_id: Uuid, author: Uuid, incoming: &VectorClock) -> Causality {
        let room = &self.clock;

        if incoming.le(room) {
            return Causality::Discarded;
        }

        if !room.lt(incoming) && !incoming.lt(room) {
            // Concurrent with our view. A one-step divergence of the
            // remote coordinates is an authentically simultaneous send;
            // anything wider means we are missing history.
            let received = incoming.slice_excluding(local_id).sum() as i64;
            let ours = room.slice_excluding(local_id).sum() as i64;
            return if (received - ours).abs() <= 1 {
                Causality::Accepted
            } else {
                Causality::Queued
            };
        }

        // Causally after us: deliverable iff it is the author's next
        // message and depends on nothing we have not already applied.
        if incoming.get(author) == room.get(author) + 1
            && incoming
                .slice_excluding(author)
                .le(&room.slice_excluding(author))
        {
            Causality::Accepted
        } else {
            Causality::Queued
        }
    }

    /// Deliver an accepted text: append it and absorb its clock.
    pub fn apply(&mut self, text: RoomText, clock: &VectorClock) {
        self.history.push(text);
        self.clock.merge(clock);
    }

    /// Record a locally authored text: bump our coordinate and return the
    /// snapshot to ship with it.
    pub fn apply_local(&mut self, local_id: Uuid, text: RoomText) -> VectorClock {
        self.history.push(text);
        self.clock.increment(local_id);
        self.clock.clone()
    }

    /// Park a text until later arrivals unblock it.
    pub fn defer(&mut self, text: RoomText, clock: VectorClock) {
        self.deferred.push_back(PendingText { text, clock });
    }

    /// Re-scan the deferral queue until no entry changes state, delivering
    /// everything that has become acceptable and dropping what is now
    /// superseded. Returns delivered texts in delivery order.
    pub fn drain_ready(&mut self, local_id: Uuid) -> Vec<RoomText> {
        let mut delivered = Vec::new();
        loop {
            let mut progressed = false;
            let mut index = 0;
            while index < self.deferred.len() {
                let status = {
                    let pending = &self.deferred[index];
                    self.evaluate(local_id, pending.text.author, &pending.clock)
                };
                match status {
                    Causality::Accepted => {
                        let pending = self.deferred.remove(index).expect("index in range");
                        self.apply(pending.text.clone(), &pending.clock);
                        delivered.push(pending.text);
                        progressed = true;
                    }
                    Causality::Discarded => {
                        self.deferred.remove(index);
                        progressed = true;
                    }
                    Causality::Queued => index += 1,
                }
            }
            if !progressed {
                break;
            }
        }
        delivered
    }
}

/// Which side of the registry a room lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomSide {
    Created,
    Participating,
}

/// The two disjoint room sets: rooms this node originated and rooms it
/// was added to. A room id lives in exactly one of them.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    created: HashMap<Uuid, Room>,
    participating: HashMap<Uuid, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_created(&mut self, room: Room) {
        debug_assert!(!self.participating.contains_key(&room.desc.id));
        self.created.insert(room.desc.id, room);
    }

    pub fn insert_participating(&mut self, room: Room) {
        debug_assert!(!self.created.contains_key(&room.desc.id));
        self.participating.insert(room.desc.id, room);
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.created.contains_key(&id) || self.participating.contains_key(&id)
    }

    pub fn side(&self, id: Uuid) -> Option<RoomSide> {
        if self.created.contains_key(&id) {
            Some(RoomSide::Created)
        } else if self.participating.contains_key(&id) {
            Some(RoomSide::Participating)
        } else {
            None
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Room> {
        self.created.get(&id).or_else(|| self.participating.get(&id))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Room> {
        if let Some(room) = self.created.get_mut(&id) {
            return Some(room);
        }
        self.participating.get_mut(&id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<(RoomSide, Room)> {
        if let Some(room) = self.created.remove(&id) {
            return Some((RoomSide::Created, room));
        }
        self.participating
            .remove(&id)
            .map(|room| (RoomSide::Participating, room))
    }

    /// Resolve a room by name across both sets.
    ///
    /// Names are not unique; an ambiguous match surfaces the candidates so
    /// the shell can ask the user to pick.
    pub fn by_name(&self, name: &str) -> Result<&Room> {
        let matches: Vec<&Room> = self
            .iter()
            .filter(|room| room.desc.name == name)
            .collect();
        match matches.len() {
            0 => Err(NodeError::InvalidParameter(format!(
                "there is no room named '{name}'"
            ))),
            1 => Ok(matches[0]),
            _ => Err(NodeError::SameRoomName {
                name: name.to_string(),
                candidates: matches.into_iter().map(|r| r.desc.clone()).collect(),
            }),
        }
    }

    /// Resolve a deletable (locally created) room by name.
    pub fn created_by_name(&self, name: &str) -> Result<&Room> {
        let matches: Vec<&Room> = self
            .created
            .values()
            .filter(|room| room.desc.name == name)
            .collect();
        match matches.len() {
            0 => Err(NodeError::InvalidParameter(format!(
                "there is no created room named '{name}'"
            ))),
            1 => Ok(matches[0]),
            _ => Err(NodeError::SameRoomName {
                name: name.to_string(),
                candidates: matches.into_iter().map(|r| r.desc.clone()).collect(),
            }),
        }
    }

    /// Ids of every room (either set) with `peer_id` among its members.
    pub fn rooms_with_member(&self, peer_id: Uuid) -> Vec<Uuid> {
        self.iter()
            .filter(|room| room.desc.contains(peer_id))
            .map(|room| room.desc.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.created.values().chain(self.participating.values())
    }

    pub fn created(&self) -> impl Iterator<Item = &Room> {
        self.created.values()
    }

    pub fn participating(&self) -> impl Iterator<Item = &Room> {
        self.participating.values()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.participating.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.participating.is_empty()
    }
}
