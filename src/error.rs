//! Error taxonomy shared by the inter-node channels.
//!
//! Orchestration code works with `anyhow::Result`; these enums exist where a
//! caller has to branch on what went wrong.

use thiserror::Error;

/// Failure of one outbound exchange with a peer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The peer could not be reached. Callers queue the message for retry.
    #[error("peer {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// The peer answered but refused the message.
    #[error("peer {endpoint} rejected message with status {status}")]
    Rejected { endpoint: String, status: u16 },

    /// The peer's reply could not be decoded.
    #[error("undecodable reply from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl TransportError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, TransportError::Unreachable { .. })
    }
}

/// A well-formed message that makes no sense where it arrived.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("{kind} is not accepted on the {channel} channel")]
    WrongChannel {
        kind: &'static str,
        channel: &'static str,
    },

    #[error("unsolicited {kind}")]
    Unsolicited { kind: &'static str },

    #[error("expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("expected a reply carrying {expected}, got none")]
    MissingReply { expected: &'static str },
}
