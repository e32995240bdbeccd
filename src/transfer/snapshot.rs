use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clock::VectorClock;
use crate::storage::store::ValueEntry;

/// A point-in-time copy of a node's store and clock, taken atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    pub store: BTreeMap<String, ValueEntry>,
    pub clock: VectorClock,
}

impl StateSnapshot {
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
