//! Versioned Storage Module
//!
//! Holds the replica's data: each key maps to its latest value and the vector
//! clock of the write that produced it.
//!
//! ## Core Concepts
//! - **Overwrite policy**: every write replaces the previous entry for its key,
//!   with no merge of concurrent values. Entries are never deleted.
//! - **Snapshots**: ordered copies used by state transfer and the client dump.
//! - **Client channel**: `handlers` and `protocol` adapt HTTP requests to the
//!   node's `get` / `put` / `snapshot` operations.

pub mod handlers;
pub mod protocol;
pub mod store;

pub use store::{ValueEntry, VersionedStore};
