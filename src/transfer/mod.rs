//! State Transfer Module
//!
//! Brings a joining or recovering node up to date by copying a full snapshot
//! (store + vector clock) from its seed before it starts serving clients.
//!
//! ## Flow
//! 1. The joiner sends `StateRequest` to the seed's state-transfer endpoint.
//! 2. The seed captures store and clock under its engine lock and replies with
//!    `StateResponse`.
//! 3. The joiner overwrites each received key and merges the received clock.

pub mod handlers;
pub mod service;
pub mod snapshot;

pub use service::{InstallReport, StateTransferService};
pub use snapshot::StateSnapshot;

#[cfg(test)]
mod tests;
