//! Node configuration.
//!
//! A node is fully described by its identity, the four ports it listens on and
//! an optional seed to join through. The remaining knobs tune the background
//! loops and outbound requests.

use anyhow::{Result, bail};
use std::collections::HashSet;
use std::time::Duration;

use crate::membership::types::{NodeId, PeerIdentity, SeedAddr};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 64;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: NodeId,
    /// Interface the listeners bind to.
    pub bind_host: String,
    /// Host other nodes use to reach us. Sent in join requests and announcements.
    pub advertise_host: String,
    pub client_port: u16,
    pub replication_port: u16,
    pub discovery_port: u16,
    pub state_transfer_port: u16,
    pub seed: Option<SeedAddr>,
    pub retry_interval: Duration,
    /// Periodic reconciliation of the pending buffer, on top of the
    /// reconciliation that follows every apply. `None` disables it.
    pub reconcile_interval: Option<Duration>,
    pub stats_interval: Option<Duration>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound on concurrently running handlers, per channel.
    pub max_concurrent_requests: usize,
}

impl NodeConfig {
    /// Configuration with ports `base..=base+3` (client, replication,
    /// discovery, state transfer) on localhost.
    pub fn local(node_id: impl Into<NodeId>, base_port: u16) -> Self {
        Self {
            node_id: node_id.into(),
            bind_host: "127.0.0.1".to_string(),
            advertise_host: "127.0.0.1".to_string(),
            client_port: base_port,
            replication_port: base_port.wrapping_add(1),
            discovery_port: base_port.wrapping_add(2),
            state_transfer_port: base_port.wrapping_add(3),
            seed: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            reconcile_interval: Some(DEFAULT_RECONCILE_INTERVAL),
            stats_interval: Some(DEFAULT_STATS_INTERVAL),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }

    pub fn with_seed(mut self, host: impl Into<String>, discovery_port: u16) -> Self {
        self.seed = Some(SeedAddr {
            host: host.into(),
            discovery_port,
        });
        self
    }

    pub fn with_advertise_host(mut self, host: impl Into<String>) -> Self {
        self.advertise_host = host.into();
        self
    }

    /// The identity this node advertises to its peers.
    pub fn identity(&self) -> PeerIdentity {
        PeerIdentity {
            node_id: self.node_id.clone(),
            host: self.advertise_host.clone(),
            replication_port: self.replication_port,
            discovery_port: self.discovery_port,
            state_transfer_port: self.state_transfer_port,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_id.as_str().is_empty() {
            bail!("node id must not be empty");
        }
        if self.advertise_host.is_empty() {
            bail!("advertised host must not be empty");
        }

        let ports = [
            ("client", self.client_port),
            ("replication", self.replication_port),
            ("discovery", self.discovery_port),
            ("state-transfer", self.state_transfer_port),
        ];
        let mut seen = HashSet::new();
        for (name, port) in ports {
            if port != 0 && !seen.insert(port) {
                bail!("{} port {} is already used by another channel", name, port);
            }
        }

        if self.retry_interval.is_zero() {
            bail!("retry interval must be greater than zero");
        }
        if self.reconcile_interval.is_some_and(|d| d.is_zero()) {
            bail!("reconcile interval must be greater than zero");
        }
        if self.stats_interval.is_some_and(|d| d.is_zero()) {
            bail!("stats interval must be greater than zero");
        }
        if self.max_concurrent_requests == 0 {
            bail!("max concurrent requests must be at least 1");
        }

        if let Some(seed) = &self.seed
            && seed.host == self.advertise_host
            && seed.discovery_port == self.discovery_port
        {
            bail!("node cannot use itself as seed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_layout() {
        let config = NodeConfig::local("n1", 8080);

        assert_eq!(
            (
                config.client_port,
                config.replication_port,
                config.discovery_port,
                config.state_transfer_port
            ),
            (8080, 8081, 8082, 8083)
        );
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_identity_uses_advertised_host() {
        let config = NodeConfig::local("n1", 8080).with_advertise_host("10.1.2.3");
        let identity = config.identity();

        assert_eq!(identity.node_id.as_str(), "n1");
        assert_eq!(identity.host, "10.1.2.3");
        assert_eq!(identity.replication_port, 8081);
        assert_eq!(identity.state_transfer_port, 8083);
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        let mut config = NodeConfig::local("n1", 8080);
        config.discovery_port = config.replication_port;
        assert!(config.validate().is_err());

        // Ephemeral ports may repeat.
        let mut config = NodeConfig::local("n1", 8080);
        config.client_port = 0;
        config.discovery_port = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = NodeConfig::local("n1", 8080);
        config.retry_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::local("n1", 8080);
        config.reconcile_interval = Some(Duration::ZERO);
        assert!(config.validate().is_err());

        let mut config = NodeConfig::local("n1", 8080);
        config.reconcile_interval = None;
        config.stats_interval = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_self_seed_rejected() {
        let config = NodeConfig::local("n1", 8080).with_seed("127.0.0.1", 8082);
        assert!(config.validate().is_err());

        let config = NodeConfig::local("n2", 8090).with_seed("127.0.0.1", 8082);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        let config = NodeConfig::local("", 8080);
        assert!(config.validate().is_err());
    }
}
