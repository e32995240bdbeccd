//! Replication Module
//!
//! Pushes every local write to all known peers and keeps failed deliveries
//! around until they succeed.
//!
//! ## Submodules
//! - **`dispatcher`**: per-peer fan-out tasks and the periodic retry loop.
//! - **`queue`**: per-peer outbound queues with remove-on-success semantics.
//! - **`handlers`**: receiving end of the replication channel.

pub mod dispatcher;
pub mod handlers;
pub mod queue;

pub use dispatcher::{ReplicationDispatcher, RetryReport};
pub use queue::{OutboundQueues, QueuedMessage};
