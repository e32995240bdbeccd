use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transport::protocol::{Channel, Endpoint};

/// Stable identifier of a node. Also the dimension name in vector clocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Membership dedup key. Two identities describe the same peer when they
/// share host and replication port, whatever the other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    pub host: String,
    pub replication_port: u16,
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.replication_port)
    }
}

/// Represents a single member of the cluster.
///
/// Carries everything another node needs to reach it on each inter-node
/// channel. The client port is deliberately absent: peers never talk to each
/// other over the client channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerIdentity {
    pub node_id: NodeId,
    pub host: String,
    pub replication_port: u16,
    pub discovery_port: u16,
    pub state_transfer_port: u16,
}

impl PeerIdentity {
    pub fn addr(&self) -> PeerAddr {
        PeerAddr {
            host: self.host.clone(),
            replication_port: self.replication_port,
        }
    }

    pub fn port_for(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Replication => self.replication_port,
            Channel::Discovery => self.discovery_port,
            Channel::StateTransfer => self.state_transfer_port,
        }
    }

    pub fn endpoint(&self, channel: Channel) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port_for(channel), channel)
    }

    /// True when `other` names the same peer, either by id or by address.
    pub fn is_same_peer(&self, other: &PeerIdentity) -> bool {
        self.node_id == other.node_id || self.addr() == other.addr()
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (repl={} disc={} state={})",
            self.node_id, self.host, self.replication_port, self.discovery_port, self.state_transfer_port
        )
    }
}

/// Address of the pre-existing member a joining node contacts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAddr {
    pub host: String,
    pub discovery_port: u16,
}

impl SeedAddr {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.discovery_port, Channel::Discovery)
    }

    /// Whether a peer advertised in a join response is this seed.
    pub fn matches(&self, peer: &PeerIdentity) -> bool {
        peer.host == self.host && peer.discovery_port == self.discovery_port
    }
}

impl fmt::Display for SeedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.discovery_port)
    }
}
