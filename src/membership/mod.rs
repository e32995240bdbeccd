//! Membership & Discovery Module
//!
//! Maintains the list of known peers and runs the seed-based join protocol.
//!
//! ## Protocol
//! 1. A joining node sends `JoinRequest` (its identity) to the seed's discovery endpoint.
//! 2. The seed records the requester and replies with `JoinResponse`: itself plus every
//!    other known peer, never the requester.
//! 3. The joiner records every listed peer and remembers which entry is the seed.
//! 4. The joiner announces itself with `NewPeerAnnounce` to every peer but the seed.
//!    Unreachable peers get the announcement through the outbound retry queue.
//!
//! Membership is identity-idempotent and never shrinks.

pub mod directory;
pub mod handlers;
pub mod service;
pub mod types;

pub use directory::PeerDirectory;
pub use service::{JoinOutcome, MembershipService};
pub use types::{NodeId, PeerAddr, PeerIdentity, SeedAddr};

#[cfg(test)]
mod tests;
