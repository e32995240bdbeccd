//! Node Module
//!
//! The replica as a whole: the orchestrator that composes clock, store, causal
//! delivery, membership, replication and state transfer, plus the servers that
//! expose it on its four channels.

pub mod node;
pub mod server;

pub use node::{BackgroundTasks, JoinReport, Node, WriteReceipt};
pub use server::{ChannelListeners, run, serve, serve_client, serve_peers};

#[cfg(test)]
pub(crate) mod loopback;
