//! Causal Delivery Engine
//!
//! Owns the node's live vector clock and the buffer of remote updates that are
//! not yet causally ready. Writes reach the shared `VersionedStore` only through
//! this engine, so the owner can serialize every mutation of
//! `{clock, store, buffer}` behind a single lock.
//!
//! ## Update lifecycle
//! `Received -> Discarded | Applied | Buffered`, and later `Buffered -> Applied`
//! once its causal predecessors have been applied. A buffered update whose
//! predecessor never arrives stays buffered.

use std::sync::Arc;

use super::event::UpdateEvent;
use crate::clock::VectorClock;
use crate::membership::types::NodeId;
use crate::storage::store::VersionedStore;

/// Outcome of offering a remote update to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The local clock already dominates the update.
    Discarded,
    /// Applied immediately; `reconciled` buffered updates were drained after it.
    Applied { reconciled: usize },
    /// Held back until its causal predecessors arrive.
    Buffered,
}

pub struct CausalDeliveryEngine {
    local_id: NodeId,
    clock: VectorClock,
    pending: Vec<UpdateEvent>,
    store: Arc<VersionedStore>,
}

impl CausalDeliveryEngine {
    pub fn new(local_id: NodeId, store: Arc<VersionedStore>) -> Self {
        let clock = VectorClock::seeded(&local_id);
        Self {
            local_id,
            clock,
            pending: Vec::new(),
            store,
        }
    }

    pub fn local_id(&self) -> &NodeId {
        &self.local_id
    }

    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Extends the clock with a newly learned peer dimension.
    pub fn add_server(&mut self, id: &NodeId) -> bool {
        let added = self.clock.add_server(id);
        if added {
            tracing::debug!("Clock extended with {} -> {}", id, self.clock);
        }
        added
    }

    /// Records a write originated here and returns the event to replicate.
    pub fn local_write(&mut self, key: &str, value: &str) -> UpdateEvent {
        self.clock.increment(&self.local_id);
        let event = UpdateEvent::new(key, value, self.local_id.clone(), self.clock.clone());

        self.store.put(key, value, event.clock.clone());
        tracing::info!(
            "Local write applied on key {} value {} VC {}",
            key,
            value,
            self.clock
        );

        self.reconcile();
        event
    }

    /// Offers a remote update: discard if stale, apply if ready, else buffer.
    pub fn receive(&mut self, update: UpdateEvent) -> Delivery {
        if self.clock.dominates(&update.clock) {
            tracing::debug!(
                "Ignored obsolete update for key {} VC {}",
                update.key,
                update.clock
            );
            return Delivery::Discarded;
        }

        if self.clock.can_apply(&update.origin, &update.clock) {
            tracing::info!(
                "Remote update applied for key {} value {} from {} VC {}",
                update.key,
                update.value,
                update.origin,
                update.clock
            );
            self.apply(update);
            let reconciled = self.reconcile();
            return Delivery::Applied { reconciled };
        }

        if self.pending.contains(&update) {
            tracing::debug!(
                "Duplicate of buffered update for key {} from {} VC {} ignored",
                update.key,
                update.origin,
                update.clock
            );
            return Delivery::Buffered;
        }

        tracing::info!(
            "Remote update buffered for key {} from {} seq {} VC {} (local VC {})",
            update.key,
            update.origin,
            update.sequence(),
            update.clock,
            self.clock
        );
        self.pending.push(update);
        Delivery::Buffered
    }

    /// Drains every buffered update that has become applicable, and drops
    /// those the local clock already covers.
    ///
    /// Passes repeat until one full pass makes no progress, so a chain from the
    /// same origin drains in a single call once its prefix is present.
    /// Returns the number of updates applied.
    pub fn reconcile(&mut self) -> usize {
        let mut applied = 0;

        loop {
            let mut progress = false;
            let mut idx = 0;

            while idx < self.pending.len() {
                if self.clock.dominates(&self.pending[idx].clock) {
                    let stale = self.pending.remove(idx);
                    tracing::debug!(
                        "Discarded buffered update for key {} from {} VC {}, already covered by {}",
                        stale.key,
                        stale.origin,
                        stale.clock,
                        self.clock
                    );
                } else if self
                    .clock
                    .can_apply(&self.pending[idx].origin, &self.pending[idx].clock)
                {
                    let update = self.pending.remove(idx);
                    tracing::info!(
                        "Pending update applied for key {} from {}",
                        update.key,
                        update.origin
                    );
                    self.apply(update);
                    applied += 1;
                    progress = true;
                } else {
                    idx += 1;
                }
            }

            if !progress {
                break;
            }
        }

        applied
    }

    /// Merges a received clock, as done when installing transferred state.
    pub fn merge_clock(&mut self, other: &VectorClock) {
        self.clock.merge(other);
    }

    fn apply(&mut self, update: UpdateEvent) {
        if let Some(previous) = self.store.get_entry(&update.key)
            && previous.clock.is_concurrent_with(&update.clock)
        {
            tracing::debug!(
                "Concurrent write on key {} overwritten in arrival order ({} replaced by {})",
                update.key,
                previous.clock,
                update.clock
            );
        }

        self.clock.merge(&update.clock);
        self.store.put(update.key, update.value, update.clock);
    }
}
