//! Replication Dispatcher
//!
//! Best-effort fan-out of messages to peers. Each delivery is its own task, so a
//! slow or dead peer never holds up the others. Failed deliveries are queued in
//! `OutboundQueues` and retried by a background loop on a fixed interval.
//!
//! ## Guarantees
//! - At-least-once delivery to every peer that eventually becomes reachable.
//! - No ordering across peers, and none within one peer's retries either: a
//!   later message can be delivered and dropped from the queue while an
//!   earlier one is still failing. Receivers rely on causal buffering instead.
//! - No backoff and no retry deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};

use super::queue::OutboundQueues;
use crate::causal::event::UpdateEvent;
use crate::error::TransportError;
use crate::membership::directory::PeerDirectory;
use crate::membership::types::PeerIdentity;
use crate::transport::{Message, PeerTransport};

/// Counters from one pass of the retry loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub attempted: usize,
    pub delivered: usize,
}

pub struct ReplicationDispatcher {
    directory: Arc<PeerDirectory>,
    outbound: Arc<OutboundQueues>,
    transport: Arc<dyn PeerTransport>,
    retry_interval: Duration,
}

impl ReplicationDispatcher {
    pub fn new(
        directory: Arc<PeerDirectory>,
        outbound: Arc<OutboundQueues>,
        transport: Arc<dyn PeerTransport>,
        retry_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            directory,
            outbound,
            transport,
            retry_interval,
        })
    }

    pub fn outbound(&self) -> &Arc<OutboundQueues> {
        &self.outbound
    }

    /// Sends `update` to every known peer, one task per peer.
    pub fn broadcast_update(self: &Arc<Self>, update: UpdateEvent) -> Vec<JoinHandle<()>> {
        let peers = self.directory.peers();
        tracing::debug!(
            "Replicating key {} (VC {}) to {} peers",
            update.key,
            update.clock,
            peers.len()
        );

        peers
            .into_iter()
            .map(|peer| self.send_to(peer, Message::Update(update.clone())))
            .collect()
    }

    /// Delivers `message` to each of `peers`, one task per peer.
    pub fn send_to_all(
        self: &Arc<Self>,
        peers: Vec<PeerIdentity>,
        message: Message,
    ) -> Vec<JoinHandle<()>> {
        peers
            .into_iter()
            .map(|peer| self.send_to(peer, message.clone()))
            .collect()
    }

    /// Fire-and-forget delivery. A failure lands the message in the peer's
    /// outbound queue.
    pub fn send_to(self: &Arc<Self>, peer: PeerIdentity, message: Message) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(&peer, message.clone()).await {
                tracing::warn!(
                    "Delivery of {} to {} failed, queued for retry: {}",
                    message.kind(),
                    peer.node_id,
                    e
                );
                dispatcher.outbound.enqueue(&peer, message);
            }
        })
    }

    /// One attempt, routed to the channel the message belongs to.
    pub async fn deliver(&self, peer: &PeerIdentity, message: Message) -> Result<(), TransportError> {
        let endpoint = peer.endpoint(message.channel());
        let kind = message.kind();
        self.transport.exchange(&endpoint, message).await?;
        tracing::debug!("Delivered {} to {}", kind, endpoint);
        Ok(())
    }

    /// Retries every queued message once, removing each one that gets through.
    ///
    /// Each peer's backlog runs in its own task, in enqueue order, so a peer
    /// that hangs until the connect timeout only delays its own messages.
    pub async fn retry_pending(self: &Arc<Self>) -> RetryReport {
        let mut batches = JoinSet::new();
        for peer in self.outbound.peers_with_pending() {
            let dispatcher = self.clone();
            batches.spawn(async move { dispatcher.retry_peer(peer).await });
        }

        let mut report = RetryReport::default();
        while let Some(result) = batches.join_next().await {
            match result {
                Ok(batch) => {
                    report.attempted += batch.attempted;
                    report.delivered += batch.delivered;
                }
                Err(e) => tracing::warn!("Retry task failed: {}", e),
            }
        }
        report
    }

    async fn retry_peer(&self, peer: PeerIdentity) -> RetryReport {
        let mut report = RetryReport::default();
        let addr = peer.addr();

        for queued in self.outbound.pending_for(&addr) {
            report.attempted += 1;
            let kind = queued.message.kind();
            match self.deliver(&peer, queued.message).await {
                Ok(()) => {
                    self.outbound.remove(&addr, queued.id);
                    report.delivered += 1;
                    tracing::info!("Successfully resent {} to {}", kind, peer.node_id);
                }
                Err(e) if e.is_unreachable() => {
                    tracing::debug!("Retry of {} to {} failed: {}", kind, peer.node_id, e);
                }
                Err(e) => {
                    tracing::warn!("Retry of {} to {} rejected: {}", kind, peer.node_id, e);
                }
            }
        }

        report
    }

    /// Spawns the retry loop. It runs for the lifetime of the node.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.retry_loop().await;
        })
    }

    async fn retry_loop(self: &Arc<Self>) {
        tracing::info!("Retry loop started (interval {:?})", self.retry_interval);
        let mut interval = tokio::time::interval(self.retry_interval);
        // The first tick fires immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if self.outbound.total_len() == 0 {
                continue;
            }
            let report = self.retry_pending().await;
            if report.attempted > 0 {
                tracing::debug!(
                    "Retry pass delivered {}/{} queued messages",
                    report.delivered,
                    report.attempted
                );
            }
        }
    }
}
