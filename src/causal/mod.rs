//! Causal Delivery Module
//!
//! Guarantees that a remote write is applied only after every write it causally
//! depends on. Updates that arrive early are buffered and retried whenever the
//! local clock advances.
//!
//! ## Submodules
//! - **`event`**: the replicated `UpdateEvent` and its frozen clock.
//! - **`engine`**: admission, buffering and fixpoint reconciliation.

pub mod engine;
pub mod event;

pub use engine::{CausalDeliveryEngine, Delivery};
pub use event::UpdateEvent;
