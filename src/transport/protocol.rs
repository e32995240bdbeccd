//! Inter-node Wire Protocol
//!
//! Every message exchanged between nodes is one variant of `Message`, encoded as
//! JSON with an explicit `"type"` tag so the receiver dispatches on the tag
//! rather than probing the payload shape.
//!
//! Each channel is served on its own port under a single endpoint path.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::causal::event::UpdateEvent;
use crate::membership::types::PeerIdentity;
use crate::transfer::snapshot::StateSnapshot;

// --- API Endpoints ---

/// One-way delivery of a single `Update`.
pub const ENDPOINT_REPLICATE: &str = "/replicate";
/// Join handshake and new-peer announcements.
pub const ENDPOINT_DISCOVERY: &str = "/discovery";
/// Full snapshot request/response.
pub const ENDPOINT_STATE: &str = "/state";

/// The inter-node channels. The client channel is not listed: it speaks its
/// own request types (see `storage::protocol`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Replication,
    Discovery,
    StateTransfer,
}

impl Channel {
    pub fn path(&self) -> &'static str {
        match self {
            Channel::Replication => ENDPOINT_REPLICATE,
            Channel::Discovery => ENDPOINT_DISCOVERY,
            Channel::StateTransfer => ENDPOINT_STATE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Replication => "replication",
            Channel::Discovery => "discovery",
            Channel::StateTransfer => "state-transfer",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete place to send a message: host, port and the channel served there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub channel: Channel,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, channel: Channel) -> Self {
        Self {
            host: host.into(),
            port,
            channel,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.channel.path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.channel)
    }
}

/// The wire protocol for inter-node communication.
///
/// - `JoinRequest/JoinResponse`: handshake between a joining node and its seed.
/// - `NewPeerAnnounce`: a joined node introducing itself to the other members.
/// - `Update`: one replicated write.
/// - `StateRequest/StateResponse`: snapshot bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    JoinRequest(PeerIdentity),

    JoinResponse { peers: Vec<PeerIdentity> },

    NewPeerAnnounce { peer: PeerIdentity },

    Update(UpdateEvent),

    StateRequest,

    StateResponse(StateSnapshot),
}

impl Message {
    /// The channel this message travels on.
    pub fn channel(&self) -> Channel {
        match self {
            Message::JoinRequest(_)
            | Message::JoinResponse { .. }
            | Message::NewPeerAnnounce { .. } => Channel::Discovery,
            Message::Update(_) => Channel::Replication,
            Message::StateRequest | Message::StateResponse(_) => Channel::StateTransfer,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::JoinRequest(_) => "JoinRequest",
            Message::JoinResponse { .. } => "JoinResponse",
            Message::NewPeerAnnounce { .. } => "NewPeerAnnounce",
            Message::Update(_) => "Update",
            Message::StateRequest => "StateRequest",
            Message::StateResponse(_) => "StateResponse",
        }
    }
}
