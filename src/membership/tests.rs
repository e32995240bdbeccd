//! Membership Module Tests
//!
//! Validates the peer directory and both sides of the join handshake.
//!
//! ## Test Scopes
//! - **Data Structures**: id uniqueness, address-based identity, seed matching.
//! - **Directory**: deduplication by `(host, replication_port)` and ordering.
//! - **Handshake**: join response contents, seed selection and announce targets.

#[cfg(test)]
mod tests {
    use crate::error::TransportError;
    use crate::membership::directory::PeerDirectory;
    use crate::membership::service::MembershipService;
    use crate::membership::types::{NodeId, PeerIdentity, SeedAddr};
    use crate::transport::{Channel, Endpoint, Message, PeerTransport};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn peer(id: &str, host: &str) -> PeerIdentity {
        PeerIdentity {
            node_id: NodeId::from(id),
            host: host.to_string(),
            replication_port: 9001,
            discovery_port: 9002,
            state_transfer_port: 9003,
        }
    }

    fn seed_of(p: &PeerIdentity) -> SeedAddr {
        SeedAddr {
            host: p.host.clone(),
            discovery_port: p.discovery_port,
        }
    }

    /// Answers every exchange with the same reply and remembers where it went.
    struct CannedTransport {
        reply: Result<Option<Message>, TransportError>,
        calls: Mutex<Vec<Endpoint>>,
    }

    impl CannedTransport {
        fn new(reply: Result<Option<Message>, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PeerTransport for CannedTransport {
        async fn exchange(
            &self,
            endpoint: &Endpoint,
            _message: Message,
        ) -> Result<Option<Message>, TransportError> {
            self.calls.lock().unwrap().push(endpoint.clone());
            self.reply.clone()
        }
    }

    fn service(local: PeerIdentity, transport: Arc<CannedTransport>) -> MembershipService {
        MembershipService::new(local, Arc::new(PeerDirectory::new()), transport)
    }

    fn idle_service(local: PeerIdentity) -> MembershipService {
        service(local, CannedTransport::new(Ok(None)))
    }

    fn ids(peers: &[PeerIdentity]) -> Vec<&str> {
        peers.iter().map(|p| p.node_id.as_str()).collect()
    }

    // ============================================================
    // DATA STRUCTURE TESTS
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        assert_ne!(NodeId::new(), NodeId::new(), "Each NodeId should be unique");
    }

    #[test]
    fn test_node_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::from("n1")).unwrap();
        assert_eq!(json, r#""n1""#);
    }

    #[test]
    fn test_same_peer_by_id_or_address() {
        let a = peer("a", "h1");

        let renamed = peer("a2", "h1");
        assert!(a.is_same_peer(&renamed), "Same address is the same peer");

        let moved = peer("a", "h2");
        assert!(a.is_same_peer(&moved), "Same id is the same peer");

        assert!(!a.is_same_peer(&peer("b", "h2")));
    }

    #[test]
    fn test_seed_matches_host_and_discovery_port() {
        let p = peer("a", "h1");
        assert!(seed_of(&p).matches(&p));

        let other_port = SeedAddr {
            host: "h1".to_string(),
            discovery_port: 9001,
        };
        assert!(!other_port.matches(&p));
        assert_eq!(seed_of(&p).endpoint().channel, Channel::Discovery);
    }

    // ============================================================
    // DIRECTORY TESTS
    // ============================================================

    #[test]
    fn test_directory_dedups_by_address() {
        let directory = PeerDirectory::new();

        assert!(directory.add(peer("a", "h1")));
        assert!(!directory.add(peer("a", "h1")), "Exact duplicate");
        assert!(!directory.add(peer("other-id", "h1")), "Same host and replication port");

        let mut other_port = peer("a", "h1");
        other_port.replication_port = 9101;
        assert!(directory.add(other_port));

        assert_eq!(directory.len(), 2);
        assert_eq!(ids(&directory.peers()), vec!["a", "a"], "First identity per address wins");
    }

    #[test]
    fn test_directory_lists_peers_by_id() {
        let directory = PeerDirectory::new();
        directory.add(peer("c", "h3"));
        directory.add(peer("a", "h1"));
        directory.add(peer("b", "h2"));

        assert_eq!(ids(&directory.peers()), vec!["a", "b", "c"]);
        assert_eq!(directory.len(), 3);
    }

    // ============================================================
    // SEED SIDE
    // ============================================================

    #[test]
    fn test_admit_ignores_self() {
        let local = peer("a", "h1");
        let membership = idle_service(local.clone());

        assert!(!membership.admit(local));
        assert!(membership.admit(peer("b", "h2")));
        assert!(!membership.admit(peer("b", "h2")));
        assert_eq!(membership.directory.len(), 1);
    }

    #[test]
    fn test_join_response_lists_seed_first_and_omits_requester() {
        let membership = idle_service(peer("A", "ha"));
        let c = peer("C", "hc");
        membership.admit(peer("B", "hb"));
        membership.admit(c.clone());

        let response = membership.join_response_for(&c);

        assert_eq!(ids(&response), vec!["A", "B"]);
    }

    // ============================================================
    // JOINER SIDE
    // ============================================================

    #[test]
    fn test_absorb_records_peers_and_finds_seed() {
        let membership = idle_service(peer("C", "hc"));
        let a = peer("A", "ha");

        let outcome = membership
            .absorb_join_response(&seed_of(&a), vec![a.clone(), peer("B", "hb")])
            .unwrap();

        assert_eq!(outcome.seed, a);
        assert_eq!(ids(&outcome.learned), vec!["A", "B"]);
        assert_eq!(ids(&membership.directory.peers()), vec!["A", "B"]);
    }

    #[test]
    fn test_absorb_skips_self_in_response() {
        let local = peer("C", "hc");
        let membership = idle_service(local.clone());
        let a = peer("A", "ha");

        let outcome = membership
            .absorb_join_response(&seed_of(&a), vec![a.clone(), local])
            .unwrap();

        assert_eq!(ids(&outcome.learned), vec!["A"]);
        assert_eq!(membership.directory.len(), 1);
    }

    #[test]
    fn test_absorb_falls_back_to_first_entry() {
        let membership = idle_service(peer("C", "hc"));
        let a = peer("A", "ha");

        // Seed reached through an alias that matches no advertised entry.
        let alias = SeedAddr {
            host: "seed.example".to_string(),
            discovery_port: 9002,
        };
        let outcome = membership
            .absorb_join_response(&alias, vec![a.clone(), peer("B", "hb")])
            .unwrap();

        assert_eq!(outcome.seed, a);
    }

    #[test]
    fn test_absorb_rejects_empty_response() {
        let membership = idle_service(peer("C", "hc"));
        let seed = seed_of(&peer("A", "ha"));

        assert!(membership.absorb_join_response(&seed, vec![]).is_err());
    }

    #[test]
    fn test_announce_targets_exclude_seed() {
        let membership = idle_service(peer("C", "hc"));
        let a = peer("A", "ha");
        membership.admit(a.clone());
        membership.admit(peer("B", "hb"));
        membership.admit(peer("D", "hd"));

        assert_eq!(ids(&membership.announce_targets(&a)), vec!["B", "D"]);
        assert_eq!(
            membership.announcement(),
            Message::NewPeerAnnounce {
                peer: peer("C", "hc")
            }
        );
    }

    #[tokio::test]
    async fn test_request_join_goes_to_seed_discovery_port() {
        let a = peer("A", "ha");
        let transport = CannedTransport::new(Ok(Some(Message::JoinResponse {
            peers: vec![a.clone()],
        })));
        let membership = service(peer("C", "hc"), transport.clone());

        let outcome = membership.request_join(&seed_of(&a)).await.unwrap();

        assert_eq!(outcome.seed, a);
        let calls = transport.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![a.endpoint(Channel::Discovery)]);
    }

    #[tokio::test]
    async fn test_request_join_rejects_wrong_reply() {
        let seed = seed_of(&peer("A", "ha"));

        let membership = service(
            peer("C", "hc"),
            CannedTransport::new(Ok(Some(Message::StateRequest))),
        );
        assert!(membership.request_join(&seed).await.is_err());

        let membership = service(peer("C", "hc"), CannedTransport::new(Ok(None)));
        assert!(membership.request_join(&seed).await.is_err());

        let membership = service(
            peer("C", "hc"),
            CannedTransport::new(Err(TransportError::Unreachable {
                endpoint: seed.to_string(),
                reason: "connection refused".to_string(),
            })),
        );
        assert!(membership.request_join(&seed).await.is_err());
        assert!(membership.directory.is_empty());
    }
}
