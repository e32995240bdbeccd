use anyhow::Result;
use causal_cluster::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_RECONCILE_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_INTERVAL, DEFAULT_STATS_INTERVAL,
};
use causal_cluster::membership::types::{NodeId, SeedAddr};
use causal_cluster::node::{ChannelListeners, Node, run};
use causal_cluster::NodeConfig;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Runs one replica of the causally consistent key-value store.
#[derive(Debug, Parser)]
#[command(name = "causal-node", version)]
struct Args {
    /// Node identifier. A random UUID is used when omitted.
    #[arg(long, env = "CAUSAL_NODE_ID")]
    id: Option<String>,

    /// Interface to bind the listeners to.
    #[arg(long, env = "CAUSAL_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Host peers use to reach this node.
    #[arg(long, env = "CAUSAL_ADVERTISE", default_value = "127.0.0.1")]
    advertise: String,

    /// Base port: client = base, replication = base+1, discovery = base+2,
    /// state transfer = base+3. Individual ports override it.
    #[arg(long, env = "CAUSAL_BASE_PORT", default_value_t = 8080)]
    base_port: u16,

    #[arg(long, env = "CAUSAL_CLIENT_PORT")]
    client_port: Option<u16>,

    #[arg(long, env = "CAUSAL_REPLICATION_PORT")]
    replication_port: Option<u16>,

    #[arg(long, env = "CAUSAL_DISCOVERY_PORT")]
    discovery_port: Option<u16>,

    #[arg(long, env = "CAUSAL_STATE_PORT")]
    state_port: Option<u16>,

    /// Host of an existing member to join through.
    #[arg(long, env = "CAUSAL_SEED_HOST", requires = "seed_port")]
    seed_host: Option<String>,

    /// Discovery port of the seed.
    #[arg(long, env = "CAUSAL_SEED_PORT", requires = "seed_host")]
    seed_port: Option<u16>,

    #[arg(long, env = "CAUSAL_RETRY_MS", default_value_t = DEFAULT_RETRY_INTERVAL.as_millis() as u64)]
    retry_ms: u64,

    /// Periodic reconciliation of buffered updates; 0 disables it.
    #[arg(long, env = "CAUSAL_RECONCILE_MS", default_value_t = DEFAULT_RECONCILE_INTERVAL.as_millis() as u64)]
    reconcile_ms: u64,

    /// Stats reporting interval; 0 disables it.
    #[arg(long, env = "CAUSAL_STATS_MS", default_value_t = DEFAULT_STATS_INTERVAL.as_millis() as u64)]
    stats_ms: u64,

    #[arg(long, env = "CAUSAL_CONNECT_TIMEOUT_MS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    connect_timeout_ms: u64,

    #[arg(long, env = "CAUSAL_REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)]
    request_timeout_ms: u64,

    /// Maximum concurrently running handlers per channel.
    #[arg(long, env = "CAUSAL_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT_REQUESTS)]
    max_concurrent: usize,
}

impl Args {
    fn into_config(self) -> NodeConfig {
        let node_id = self.id.map(NodeId::from).unwrap_or_default();
        let mut config = NodeConfig::local(node_id, self.base_port);

        config.bind_host = self.bind;
        config.advertise_host = self.advertise;
        if let Some(port) = self.client_port {
            config.client_port = port;
        }
        if let Some(port) = self.replication_port {
            config.replication_port = port;
        }
        if let Some(port) = self.discovery_port {
            config.discovery_port = port;
        }
        if let Some(port) = self.state_port {
            config.state_transfer_port = port;
        }
        if let (Some(host), Some(discovery_port)) = (self.seed_host, self.seed_port) {
            config.seed = Some(SeedAddr {
                host,
                discovery_port,
            });
        }

        config.retry_interval = Duration::from_millis(self.retry_ms);
        config.reconcile_interval = optional_interval(self.reconcile_ms);
        config.stats_interval = optional_interval(self.stats_ms);
        config.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        config.request_timeout = Duration::from_millis(self.request_timeout_ms);
        config.max_concurrent_requests = self.max_concurrent;
        config
    }
}

fn optional_interval(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();

    tracing::info!("Starting node {}", config.node_id);
    match &config.seed {
        Some(seed) => tracing::info!("Seed node: {}", seed),
        None => tracing::info!("Starting as seed node (founder)"),
    }

    // 1. Listeners first, so peers can reach us as soon as we announce ourselves.
    let listeners = ChannelListeners::bind(&config).await?;
    let node = Node::new(config)?;

    // 2. Background loops:
    let _background = node.start_background();

    // 3. Inter-node channels, join and state transfer, then the client channel:
    if let Err(e) = run(node, listeners).await {
        tracing::error!("Listener failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
