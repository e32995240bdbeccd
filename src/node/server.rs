//! Channel servers.
//!
//! Every channel gets its own listener and axum router. Requests are handled
//! one task per connection, and a concurrency limit caps how many handlers of
//! one channel run at the same time.

use anyhow::{Context, Result};
use axum::{
    Extension, Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;

use super::node::Node;
use crate::config::NodeConfig;
use crate::membership::handlers::handle_discovery;
use crate::replication::handlers::handle_replicate;
use crate::storage::handlers::{handle_dump, handle_get, handle_put};
use crate::storage::protocol::{ENDPOINT_DUMP, ENDPOINT_GET, ENDPOINT_PUT};
use crate::transfer::handlers::handle_state_request;
use crate::transport::{Channel, Message};

/// Bound listeners for the four channels.
pub struct ChannelListeners {
    pub client: TcpListener,
    pub replication: TcpListener,
    pub discovery: TcpListener,
    pub state_transfer: TcpListener,
}

impl ChannelListeners {
    pub async fn bind(config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            client: bind_one(&config.bind_host, config.client_port, "client").await?,
            replication: bind_one(&config.bind_host, config.replication_port, "replication")
                .await?,
            discovery: bind_one(&config.bind_host, config.discovery_port, "discovery").await?,
            state_transfer: bind_one(
                &config.bind_host,
                config.state_transfer_port,
                "state-transfer",
            )
            .await?,
        })
    }
}

async fn bind_one(host: &str, port: u16, channel: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {} listener on {}:{}", channel, host, port))?;
    Ok(listener)
}

pub fn client_router(node: Arc<Node>) -> Router {
    let limit = node.config().max_concurrent_requests;
    Router::new()
        .route(&format!("{}/:key", ENDPOINT_GET), get(handle_get))
        .route(ENDPOINT_PUT, post(handle_put))
        .route(ENDPOINT_DUMP, get(handle_dump))
        .layer(Extension(node))
        .layer(ConcurrencyLimitLayer::new(limit))
}

pub fn replication_router(node: Arc<Node>) -> Router {
    let limit = node.config().max_concurrent_requests;
    Router::new()
        .route(Channel::Replication.path(), post(handle_replicate))
        .layer(Extension(node))
        .layer(ConcurrencyLimitLayer::new(limit))
}

pub fn discovery_router(node: Arc<Node>) -> Router {
    let limit = node.config().max_concurrent_requests;
    Router::new()
        .route(Channel::Discovery.path(), post(handle_discovery))
        .layer(Extension(node))
        .layer(ConcurrencyLimitLayer::new(limit))
}

pub fn state_transfer_router(node: Arc<Node>) -> Router {
    let limit = node.config().max_concurrent_requests;
    Router::new()
        .route(Channel::StateTransfer.path(), post(handle_state_request))
        .layer(Extension(node))
        .layer(ConcurrencyLimitLayer::new(limit))
}

/// Brings a node up: inter-node channels first, then the join and state
/// transfer, and only then the client channel, so clients never read a replica
/// that has not caught up with its seed.
pub async fn run(node: Arc<Node>, listeners: ChannelListeners) -> Result<()> {
    let ChannelListeners {
        client,
        replication,
        discovery,
        state_transfer,
    } = listeners;

    let peers = tokio::spawn(serve_peers(
        node.clone(),
        replication,
        discovery,
        state_transfer,
    ));

    match node.join_cluster().await {
        Ok(Some(report)) => tracing::info!(
            "Joined via {} with {} peers, announced to {}, state installed: {}",
            report.seed.node_id,
            report.peers.len(),
            report.announced_to.len(),
            report.installed.is_some()
        ),
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to join network via seed: {:#}", e),
    }

    tracing::info!("Node {} ready, accepting client requests", node.id());

    tokio::try_join!(
        async {
            match peers.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::Error::new(e).context("inter-node listeners aborted")),
            }
        },
        serve_client(node, client),
    )?;
    Ok(())
}

/// Runs all four accept loops until one of them fails.
pub async fn serve(node: Arc<Node>, listeners: ChannelListeners) -> Result<()> {
    let ChannelListeners {
        client,
        replication,
        discovery,
        state_transfer,
    } = listeners;

    tokio::try_join!(
        serve_client(node.clone(), client),
        serve_peers(node, replication, discovery, state_transfer),
    )?;
    Ok(())
}

/// Accept loops of the inter-node channels.
pub async fn serve_peers(
    node: Arc<Node>,
    replication: TcpListener,
    discovery: TcpListener,
    state_transfer: TcpListener,
) -> Result<()> {
    log_listening("Replication", &replication);
    log_listening("Discovery", &discovery);
    log_listening("State transfer", &state_transfer);

    let replication = axum::serve(replication, replication_router(node.clone()));
    let discovery = axum::serve(discovery, discovery_router(node.clone()));
    let state_transfer = axum::serve(state_transfer, state_transfer_router(node));

    tokio::try_join!(
        async { replication.await.context("replication listener failed") },
        async { discovery.await.context("discovery listener failed") },
        async { state_transfer.await.context("state-transfer listener failed") },
    )?;
    Ok(())
}

/// Accept loop of the client channel.
pub async fn serve_client(node: Arc<Node>, client: TcpListener) -> Result<()> {
    log_listening("Client", &client);
    axum::serve(client, client_router(node))
        .await
        .context("client listener failed")
}

fn log_listening(name: &str, listener: &TcpListener) {
    match listener.local_addr() {
        Ok(addr) => tracing::info!("{} listener started on {}", name, addr),
        Err(e) => tracing::warn!("{} listener address unavailable: {}", name, e),
    }
}

/// Shared body of the inter-node handlers: decode, check the channel, dispatch.
///
/// Decoding and protocol failures are answered with `400` and never retried
/// by the receiver.
pub(crate) async fn dispatch_inbound(
    node: &Node,
    channel: Channel,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    let message = match payload {
        Ok(Json(message)) => message,
        Err(rejection) => {
            tracing::warn!("Malformed message on {} channel: {}", channel, rejection);
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    let kind = message.kind();
    tracing::debug!("Received {} on {} channel", kind, channel);

    match node.handle_on_channel(channel, message).await {
        Ok(Some(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!("Rejected {} on {} channel: {}", kind, channel, e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}
