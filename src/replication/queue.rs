//! Per-peer outbound queues.
//!
//! A message enters a peer's queue when a delivery attempt fails and leaves it
//! exactly once a later attempt succeeds. Every queued message gets a unique id
//! so the retry loop can work from a copy of the queue and remove by id,
//! without holding a lock across network calls.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::membership::types::{PeerAddr, PeerIdentity};
use crate::transport::Message;

#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub id: u64,
    pub message: Message,
}

struct PeerOutbox {
    peer: PeerIdentity,
    messages: DashMap<u64, Message>,
}

#[derive(Default)]
pub struct OutboundQueues {
    queues: DashMap<PeerAddr, PeerOutbox>,
    next_id: AtomicU64,
}

impl OutboundQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, peer: &PeerIdentity, message: Message) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let outbox = self
            .queues
            .entry(peer.addr())
            .or_insert_with(|| PeerOutbox {
                peer: peer.clone(),
                messages: DashMap::new(),
            });
        outbox.messages.insert(id, message);
        id
    }

    /// Copy of a peer's queued messages in enqueue order.
    pub fn pending_for(&self, addr: &PeerAddr) -> Vec<QueuedMessage> {
        let mut pending: Vec<QueuedMessage> = match self.queues.get(addr) {
            Some(outbox) => outbox
                .messages
                .iter()
                .map(|entry| QueuedMessage {
                    id: *entry.key(),
                    message: entry.value().clone(),
                })
                .collect(),
            None => Vec::new(),
        };
        pending.sort_by_key(|queued| queued.id);
        pending
    }

    /// Peers with at least one queued message.
    pub fn peers_with_pending(&self) -> Vec<PeerIdentity> {
        self.queues
            .iter()
            .filter(|entry| !entry.value().messages.is_empty())
            .map(|entry| entry.value().peer.clone())
            .collect()
    }

    /// Removes a delivered message. Returns false if it was already gone.
    pub fn remove(&self, addr: &PeerAddr, id: u64) -> bool {
        match self.queues.get(addr) {
            Some(outbox) => outbox.messages.remove(&id).is_some(),
            None => false,
        }
    }

    pub fn len_for(&self, addr: &PeerAddr) -> usize {
        self.queues
            .get(addr)
            .map(|outbox| outbox.messages.len())
            .unwrap_or(0)
    }

    pub fn total_len(&self) -> usize {
        self.queues
            .iter()
            .map(|entry| entry.value().messages.len())
            .sum()
    }

    /// Backlog per peer, for diagnostics.
    pub fn backlog(&self) -> Vec<(PeerIdentity, usize)> {
        self.queues
            .iter()
            .map(|entry| (entry.value().peer.clone(), entry.value().messages.len()))
            .filter(|(_, len)| *len > 0)
            .collect()
    }
}
