use anyhow::Result;
use std::sync::Arc;

use super::directory::PeerDirectory;
use super::types::{PeerIdentity, SeedAddr};
use crate::error::ProtocolError;
use crate::transport::{Message, PeerTransport};

/// Result of a successful join handshake.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// The seed's own entry in the join response, used for state transfer.
    pub seed: PeerIdentity,
    /// Every peer listed in the response other than ourselves.
    pub learned: Vec<PeerIdentity>,
}

/// Discovery protocol endpoints for one node.
///
/// Clock extension is left to the caller: this service only knows about
/// identities, the node owns the clock.
pub struct MembershipService {
    pub local: PeerIdentity,
    pub directory: Arc<PeerDirectory>,
    transport: Arc<dyn PeerTransport>,
}

impl MembershipService {
    pub fn new(
        local: PeerIdentity,
        directory: Arc<PeerDirectory>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Self {
            local,
            directory,
            transport,
        }
    }

    /// Adds a peer learned from a join request or an announcement.
    /// Returns false for ourselves or an already known address.
    pub fn admit(&self, peer: PeerIdentity) -> bool {
        if peer.is_same_peer(&self.local) {
            tracing::debug!("Ignoring our own identity {}", peer);
            return false;
        }
        self.directory.add(peer)
    }

    /// Peer list a seed sends back to `requester`: ourselves first, then every
    /// known peer except the requester.
    pub fn join_response_for(&self, requester: &PeerIdentity) -> Vec<PeerIdentity> {
        let mut peers = vec![self.local.clone()];
        peers.extend(
            self.directory
                .peers()
                .into_iter()
                .filter(|peer| !peer.is_same_peer(requester)),
        );
        peers
    }

    /// Runs the requester side of the handshake against `seed`.
    pub async fn request_join(&self, seed: &SeedAddr) -> Result<JoinOutcome> {
        let endpoint = seed.endpoint();
        tracing::info!("Sending join request to seed {}", endpoint);

        let reply = self
            .transport
            .exchange(&endpoint, Message::JoinRequest(self.local.clone()))
            .await?;

        match reply {
            Some(Message::JoinResponse { peers }) => self.absorb_join_response(seed, peers),
            Some(other) => Err(ProtocolError::UnexpectedReply {
                expected: "JoinResponse",
                actual: other.kind(),
            }
            .into()),
            None => Err(ProtocolError::MissingReply {
                expected: "JoinResponse",
            }
            .into()),
        }
    }

    /// Records every peer of a join response and picks out the seed.
    pub fn absorb_join_response(
        &self,
        seed: &SeedAddr,
        peers: Vec<PeerIdentity>,
    ) -> Result<JoinOutcome> {
        let fallback = peers.first().cloned();
        let mut seed_peer = None;
        let mut learned = Vec::with_capacity(peers.len());

        for peer in peers {
            if seed.matches(&peer) {
                seed_peer = Some(peer.clone());
            }
            if peer.is_same_peer(&self.local) {
                continue;
            }
            self.directory.add(peer.clone());
            learned.push(peer);
        }

        let seed_peer = match seed_peer.or_else(|| {
            tracing::warn!(
                "No join response entry matches seed {}, assuming the first entry is the seed",
                seed
            );
            fallback
        }) {
            Some(peer) => peer,
            None => anyhow::bail!("empty join response from seed {}", seed),
        };

        tracing::info!(
            "Joined network via seed {}. Discovered peers: {:?}",
            seed_peer.node_id,
            learned.iter().map(|p| p.node_id.as_str()).collect::<Vec<_>>()
        );

        Ok(JoinOutcome {
            seed: seed_peer,
            learned,
        })
    }

    /// Peers that must hear about us after joining: everyone but the seed,
    /// which learned about us from the join request itself.
    pub fn announce_targets(&self, seed: &PeerIdentity) -> Vec<PeerIdentity> {
        self.directory
            .peers()
            .into_iter()
            .filter(|peer| !peer.is_same_peer(seed) && !peer.is_same_peer(&self.local))
            .collect()
    }

    pub fn announcement(&self) -> Message {
        Message::NewPeerAnnounce {
            peer: self.local.clone(),
        }
    }
}
