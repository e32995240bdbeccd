use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;
use crate::membership::types::NodeId;

/// A single replicated write.
///
/// `clock` is the origin's clock right after its local increment, frozen at
/// construction. Admission is always evaluated against this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateEvent {
    pub key: String,
    pub value: String,
    pub origin: NodeId,
    pub clock: VectorClock,
}

impl UpdateEvent {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        origin: NodeId,
        clock: VectorClock,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            origin,
            clock,
        }
    }

    /// The origin's sequence number for this write.
    pub fn sequence(&self) -> u64 {
        self.clock.get(&self.origin)
    }
}
