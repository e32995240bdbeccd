//! Inter-node Transport Module
//!
//! Carries `Message`s between nodes. The receiving side is a set of axum routers
//! (one per channel, see `node::server`); the sending side is the `PeerTransport`
//! trait, implemented over HTTP by `HttpTransport`.

pub mod client;
pub mod protocol;

pub use client::{HttpTransport, PeerTransport};
pub use protocol::{Channel, Endpoint, Message};
