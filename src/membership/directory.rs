use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::types::{PeerAddr, PeerIdentity};

/// The set of known peers, deduplicated by `(host, replication_port)`.
///
/// The directory only grows: there is no failure detector and no leave
/// protocol, so a peer once learned is kept for the node's lifetime.
#[derive(Default)]
pub struct PeerDirectory {
    peers: DashMap<PeerAddr, PeerIdentity>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `peer` unless a peer with the same address is known.
    /// Returns true if the directory grew.
    pub fn add(&self, peer: PeerIdentity) -> bool {
        match self.peers.entry(peer.addr()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                tracing::info!("Added new peer {}", peer);
                slot.insert(peer);
                true
            }
        }
    }

    /// Every known peer, ordered by node id.
    pub fn peers(&self) -> Vec<PeerIdentity> {
        let mut peers: Vec<PeerIdentity> = self
            .peers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        peers.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
