//! Logical Time Module
//!
//! Vector clocks capture the happened-before relation between writes without a
//! shared physical clock. Every node owns one dimension and advances it by one
//! per local write; remote dimensions advance only by merging clocks carried on
//! applied updates.
//!
//! ## Operations
//! - **merge**: point-wise maximum, commutative, associative and idempotent.
//! - **dominates**: the receiver has observed everything the argument has.
//! - **can_apply**: causal admission test used by the delivery engine.

pub mod vector;

pub use vector::{CausalOrder, VectorClock};
