//! Causally Consistent Replicated Key-Value Store
//!
//! Every node holds a full copy of the keyspace, replicates its writes to all
//! known peers and applies remote writes in causal order using vector clocks.
//! There is no coordinator: new nodes join through any existing member.
//!
//! ## Architecture Modules
//! - **`clock`**: vector clock algebra (merge, dominance, causal admission).
//! - **`storage`**: the versioned key-value store and the client channel adapter.
//! - **`causal`**: buffering and fixpoint delivery of not-yet-ready updates.
//! - **`membership`**: the peer directory and the seed-based join protocol.
//! - **`replication`**: fan-out of writes with per-peer retry queues.
//! - **`transfer`**: full-snapshot bootstrap for joining or recovering nodes.
//! - **`transport`**: the tagged inter-node message union and its HTTP carrier.
//! - **`node`**: the orchestrator and its channel servers.

pub mod causal;
pub mod clock;
pub mod config;
pub mod error;
pub mod membership;
pub mod node;
pub mod replication;
pub mod storage;
pub mod transfer;
pub mod transport;

pub use config::NodeConfig;
pub use node::Node;
