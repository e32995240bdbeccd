use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::clock::VectorClock;

/// A stored value together with the clock of the write that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueEntry {
    pub value: String,
    pub clock: VectorClock,
}

impl fmt::Display for ValueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value: {}, VC: {}", self.value, self.clock)
    }
}

/// In-memory key -> latest `ValueEntry` map.
///
/// Writes overwrite unconditionally and entries are never deleted. Each
/// entry is replaced as a whole, so a reader never sees a value paired with
/// another write's clock.
#[derive(Default)]
pub struct VersionedStore {
    entries: DashMap<String, ValueEntry>,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing entry for `key`. Returns the previous entry.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        clock: VectorClock,
    ) -> Option<ValueEntry> {
        self.entries.insert(
            key.into(),
            ValueEntry {
                value: value.into(),
                clock,
            },
        )
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn get_entry(&self, key: &str) -> Option<ValueEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Copy of every entry, ordered by key.
    ///
    /// Callers that need the copy to line up with a clock must take it while
    /// holding the lock that serializes writers (see `CausalDeliveryEngine`).
    pub fn snapshot(&self) -> BTreeMap<String, ValueEntry> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
