//! Registry of discovered peers.

use agora_proto::Peer;
use std::collections::HashMap;
use uuid::Uuid;

/// Peers known to be on the network, keyed by identifier.
///
/// The local peer is never stored here; `add` treats it like a duplicate.
#[derive(Debug)]
pub struct PeerRegistry {
    local_id: Uuid,
    peers: HashMap<Uuid, Peer>,
}

impl PeerRegistry {
    pub fn new(local_id: Uuid) -> Self {
        Self {
            local_id,
            peers: HashMap::new(),
        }
    }

    /// Insert a peer. Returns false (and changes nothing) when a peer with
    /// that id is already known, or when the peer is the local one.
    pub fn add(&mut self, peer: Peer) -> bool {
        if peer.id == self.local_id || self.peers.contains_key(&peer.id) {
            return false;
        }
        self.peers.insert(peer.id, peer);
        true
    }

    /// Remove by id; idempotent.
    pub fn remove(&mut self, id: Uuid) -> Option<Peer> {
        self.peers.remove(&id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Peer> {
        self.peers.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.peers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Peers in the stable order the shell lists them (and the order
    /// `create` indexes resolve against): by username, then id.
    pub fn list(&self) -> Vec<Peer> {
        let mut peers: Vec<_> = self.peers.values().cloned().collect();
        peers.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u128, name: &str) -> Peer {
        Peer::with_id(Uuid::from_u128(n), name, "10.0.0.1:9000".parse().unwrap())
    }

    #[test]
    fn test_add_and_duplicate() {
        let mut reg = PeerRegistry::new(Uuid::from_u128(99));
        assert!(reg.add(peer(1, "alice")));
        assert!(!reg.add(peer(1, "alice")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_never_stores_local_peer() {
        let mut reg = PeerRegistry::new(Uuid::from_u128(99));
        assert!(!reg.add(peer(99, "me")));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = PeerRegistry::new(Uuid::from_u128(99));
        reg.add(peer(1, "alice"));
        assert!(reg.remove(Uuid::from_u128(1)).is_some());
        assert!(reg.remove(Uuid::from_u128(1)).is_none());
    }

    #[test]
    fn test_list_is_sorted_by_username() {
        let mut reg = PeerRegistry::new(Uuid::from_u128(99));
        reg.add(peer(1, "carol"));
        reg.add(peer(2, "alice"));
        reg.add(peer(3, "bob"));

        let names: Vec<_> = reg.list().into_iter().map(|p| p.username).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }
}
