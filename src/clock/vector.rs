//! Vector clock algebra.
//!
//! A `VectorClock` maps node ids to logical counters. Ids that are absent
//! read as zero, so clocks of different dimensionality compare naturally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::membership::types::NodeId;

/// Result of comparing two clocks component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// Every component of `self` is <= `other`, at least one strictly.
    Before,
    /// Every component of `self` is >= `other`, at least one strictly.
    After,
    Equal,
    /// Neither clock has observed everything the other has.
    Concurrent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    counters: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock with a single zero dimension for `id`, used at node startup.
    pub fn seeded(id: &NodeId) -> Self {
        let mut clock = Self::new();
        clock.add_server(id);
        clock
    }

    pub fn get(&self, id: &NodeId) -> u64 {
        self.counters.get(id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.counters.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Advances `id` by exactly one and returns the new counter.
    ///
    /// Only the node owning `id` may call this for its own dimension.
    pub fn increment(&mut self, id: &NodeId) -> u64 {
        let counter = self.counters.entry(id.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Point-wise maximum over the union of both key sets.
    pub fn merge(&mut self, other: &VectorClock) {
        for (id, theirs) in &other.counters {
            let ours = self.counters.entry(id.clone()).or_insert(0);
            if *theirs > *ours {
                *ours = *theirs;
            }
        }
    }

    /// True iff every component present in `other` is covered by `self`.
    ///
    /// An update whose clock is dominated carries nothing new and is stale.
    pub fn dominates(&self, other: &VectorClock) -> bool {
        other
            .counters
            .iter()
            .all(|(id, theirs)| self.get(id) >= *theirs)
    }

    /// Causal admission test for an update originated at `origin`.
    ///
    /// The update must be exactly the next event from `origin` that this
    /// clock has not seen, and every other dependency it carries must already
    /// be reflected locally.
    pub fn can_apply(&self, origin: &NodeId, update: &VectorClock) -> bool {
        update.counters.iter().all(|(id, theirs)| {
            let ours = self.get(id);
            if id == origin {
                ours.checked_add(1) == Some(*theirs)
            } else {
                ours >= *theirs
            }
        })
    }

    /// Adds a zero dimension for `id` if absent. Returns true if added.
    pub fn add_server(&mut self, id: &NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.counters.insert(id.clone(), 0);
        true
    }

    pub fn causal_order(&self, other: &VectorClock) -> CausalOrder {
        let mut less = false;
        let mut greater = false;

        for id in self.counters.keys().chain(other.counters.keys()) {
            let ours = self.get(id);
            let theirs = other.get(id);
            if ours < theirs {
                less = true;
            } else if ours > theirs {
                greater = true;
            }
        }

        match (less, greater) {
            (false, false) => CausalOrder::Equal,
            (true, false) => CausalOrder::Before,
            (false, true) => CausalOrder::After,
            (true, true) => CausalOrder::Concurrent,
        }
    }

    pub fn is_concurrent_with(&self, other: &VectorClock) -> bool {
        self.causal_order(other) == CausalOrder::Concurrent
    }
}

impl<I: Into<NodeId>> FromIterator<(I, u64)> for VectorClock {
    fn from_iter<T: IntoIterator<Item = (I, u64)>>(iter: T) -> Self {
        Self {
            counters: iter
                .into_iter()
                .map(|(id, counter)| (id.into(), counter))
                .collect(),
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (id, counter)) in self.counters.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", id, counter)?;
        }
        f.write_str("}")
    }
}
