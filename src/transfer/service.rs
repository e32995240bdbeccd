//! Snapshot capture, fetch and install.
//!
//! The transfer is coarse: the receiver overwrites every key present in the
//! snapshot and merges the sender's clock. Local writes made during the
//! transfer window are not reconciled against it.

use anyhow::Result;
use std::sync::Arc;

use super::snapshot::StateSnapshot;
use crate::causal::CausalDeliveryEngine;
use crate::error::ProtocolError;
use crate::membership::types::PeerIdentity;
use crate::transport::{Channel, Message, PeerTransport};

/// What an install changed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallReport {
    pub entries: usize,
    pub reconciled: usize,
}

pub struct StateTransferService {
    transport: Arc<dyn PeerTransport>,
}

impl StateTransferService {
    pub fn new(transport: Arc<dyn PeerTransport>) -> Self {
        Self { transport }
    }

    /// Copies store and clock. The caller holds the engine lock, so no write
    /// can land between the two copies.
    pub fn capture(engine: &CausalDeliveryEngine) -> StateSnapshot {
        StateSnapshot {
            store: engine.store().snapshot(),
            clock: engine.clock().clone(),
        }
    }

    /// Overwrites every snapshot key, merges the clock, then drains whatever
    /// the merged clock made applicable.
    pub fn install(engine: &mut CausalDeliveryEngine, snapshot: StateSnapshot) -> InstallReport {
        let entries = snapshot.store.len();
        for (key, entry) in snapshot.store {
            engine.store().put(key, entry.value, entry.clock);
        }
        engine.merge_clock(&snapshot.clock);
        let reconciled = engine.reconcile();

        tracing::info!(
            "Installed {} entries from snapshot, VC now {}",
            entries,
            engine.clock()
        );

        InstallReport {
            entries,
            reconciled,
        }
    }

    /// Asks `source` for its full state.
    pub async fn fetch(&self, source: &PeerIdentity) -> Result<StateSnapshot> {
        let endpoint = source.endpoint(Channel::StateTransfer);
        tracing::info!("Requesting state from {}", endpoint);

        match self
            .transport
            .exchange(&endpoint, Message::StateRequest)
            .await?
        {
            Some(Message::StateResponse(snapshot)) => {
                tracing::info!(
                    "Received snapshot with {} entries from {}",
                    snapshot.len(),
                    source.node_id
                );
                Ok(snapshot)
            }
            Some(other) => Err(ProtocolError::UnexpectedReply {
                expected: "StateResponse",
                actual: other.kind(),
            }
            .into()),
            None => Err(ProtocolError::MissingReply {
                expected: "StateResponse",
            }
            .into()),
        }
    }
}
