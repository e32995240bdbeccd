//! Node orchestrator.
//!
//! Composes the subsystems into one replica and owns the single lock that
//! serializes every mutation of `{clock, store, pending buffer}`. Network sends
//! are always issued after that lock has been released.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::causal::{CausalDeliveryEngine, Delivery, UpdateEvent};
use crate::clock::VectorClock;
use crate::config::NodeConfig;
use crate::error::ProtocolError;
use crate::membership::{MembershipService, NodeId, PeerDirectory, PeerIdentity};
use crate::replication::{OutboundQueues, ReplicationDispatcher};
use crate::storage::store::{ValueEntry, VersionedStore};
use crate::transfer::{InstallReport, StateSnapshot, StateTransferService};
use crate::transport::{Channel, HttpTransport, Message, PeerTransport};

/// Handle on the replication of one local write.
///
/// Dropping it leaves the fan-out running in the background.
pub struct WriteReceipt {
    pub clock: VectorClock,
    deliveries: Vec<JoinHandle<()>>,
}

impl WriteReceipt {
    /// Waits until every first delivery attempt has finished, successful or
    /// queued for retry.
    pub async fn delivered(self) {
        for handle in self.deliveries {
            if let Err(e) = handle.await {
                tracing::warn!("Replication task failed: {}", e);
            }
        }
    }
}

/// What joining through a seed produced.
pub struct JoinReport {
    pub seed: PeerIdentity,
    pub peers: Vec<PeerIdentity>,
    pub announced_to: Vec<PeerIdentity>,
    /// `None` when the state transfer failed; the node keeps its current state.
    pub installed: Option<InstallReport>,
    announcements: Vec<JoinHandle<()>>,
}

impl JoinReport {
    /// Waits for the first attempt of every `NewPeerAnnounce`.
    pub async fn announced(self) {
        for handle in self.announcements {
            if let Err(e) = handle.await {
                tracing::warn!("Announcement task failed: {}", e);
            }
        }
    }
}

/// Handles on the node's background loops.
pub struct BackgroundTasks {
    pub retry: JoinHandle<()>,
    pub reconcile: Option<JoinHandle<()>>,
    pub stats: Option<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn abort(&self) {
        self.retry.abort();
        if let Some(handle) = &self.reconcile {
            handle.abort();
        }
        if let Some(handle) = &self.stats {
            handle.abort();
        }
    }
}

pub struct Node {
    config: NodeConfig,
    identity: PeerIdentity,
    store: Arc<VersionedStore>,
    engine: Mutex<CausalDeliveryEngine>,
    membership: MembershipService,
    dispatcher: Arc<ReplicationDispatcher>,
    transfer: StateTransferService,
}

impl Node {
    /// Builds a node that talks to its peers over HTTP.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(config.connect_timeout, config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: NodeConfig,
        transport: Arc<dyn PeerTransport>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let identity = config.identity();
        let store = Arc::new(VersionedStore::new());
        let engine = CausalDeliveryEngine::new(identity.node_id.clone(), store.clone());
        let directory = Arc::new(PeerDirectory::new());
        let dispatcher = ReplicationDispatcher::new(
            directory.clone(),
            Arc::new(OutboundQueues::new()),
            transport.clone(),
            config.retry_interval,
        );
        let membership = MembershipService::new(identity.clone(), directory, transport.clone());
        let transfer = StateTransferService::new(transport);

        tracing::info!("Node {} created with VC {}", identity.node_id, engine.clock());

        Ok(Arc::new(Self {
            config,
            identity,
            store,
            engine: Mutex::new(engine),
            membership,
            dispatcher,
            transfer,
        }))
    }

    pub fn id(&self) -> &NodeId {
        &self.identity.node_id
    }

    pub fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    // --- Client surface ---

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    /// Applies a local write and starts replicating it to every known peer.
    pub async fn put(&self, key: &str, value: &str) -> WriteReceipt {
        let update = {
            let mut engine = self.engine.lock().await;
            engine.local_write(key, value)
        };

        let clock = update.clock.clone();
        let deliveries = self.dispatcher.broadcast_update(update);
        WriteReceipt { clock, deliveries }
    }

    /// Every entry with its write clock, ordered by key.
    pub async fn snapshot(&self) -> Vec<(String, ValueEntry)> {
        let _engine = self.engine.lock().await;
        self.store.snapshot().into_iter().collect()
    }

    // --- Inbound messages ---

    /// Dispatches a message that arrived on `channel`.
    pub async fn handle_on_channel(
        &self,
        channel: Channel,
        message: Message,
    ) -> Result<Option<Message>, ProtocolError> {
        if message.channel() != channel {
            return Err(ProtocolError::WrongChannel {
                kind: message.kind(),
                channel: channel.name(),
            });
        }
        self.handle_message(message).await
    }

    /// Dispatches an inbound message and returns the reply, if its exchange has one.
    pub async fn handle_message(&self, message: Message) -> Result<Option<Message>, ProtocolError> {
        match message {
            Message::Update(update) => {
                self.receive_update(update).await;
                Ok(None)
            }
            Message::JoinRequest(requester) => {
                let peers = self.handle_join_request(requester).await;
                Ok(Some(Message::JoinResponse { peers }))
            }
            Message::NewPeerAnnounce { peer } => {
                self.handle_new_peer(peer).await;
                Ok(None)
            }
            Message::StateRequest => Ok(Some(Message::StateResponse(self.state_snapshot().await))),
            unsolicited @ (Message::JoinResponse { .. } | Message::StateResponse(_)) => {
                Err(ProtocolError::Unsolicited {
                    kind: unsolicited.kind(),
                })
            }
        }
    }

    pub async fn receive_update(&self, update: UpdateEvent) -> Delivery {
        let mut engine = self.engine.lock().await;
        engine.receive(update)
    }

    /// Seed side of the join handshake.
    pub async fn handle_join_request(&self, requester: PeerIdentity) -> Vec<PeerIdentity> {
        tracing::info!("Processing join request from {}", requester);

        if !requester.is_same_peer(&self.identity) {
            self.membership.admit(requester.clone());
            self.engine.lock().await.add_server(&requester.node_id);
        }

        self.membership.join_response_for(&requester)
    }

    pub async fn handle_new_peer(&self, peer: PeerIdentity) {
        tracing::info!("Received NewPeerAnnounce for {}", peer);

        if peer.is_same_peer(&self.identity) {
            return;
        }
        let id = peer.node_id.clone();
        self.membership.admit(peer);
        self.engine.lock().await.add_server(&id);
    }

    pub async fn state_snapshot(&self) -> StateSnapshot {
        let engine = self.engine.lock().await;
        let snapshot = StateTransferService::capture(&engine);
        tracing::info!(
            "State captured for transfer: {} entries, VC {}",
            snapshot.len(),
            snapshot.clock
        );
        snapshot
    }

    // --- Cluster lifecycle ---

    /// Joins through the configured seed, announces ourselves and pulls the
    /// seed's state. Returns `None` when no seed is configured.
    ///
    /// A failed state transfer is logged and reported, not returned as an error.
    pub async fn join_cluster(&self) -> Result<Option<JoinReport>> {
        let Some(seed) = self.config.seed.clone() else {
            tracing::info!("No seed configured, starting as the founder of a new cluster");
            return Ok(None);
        };

        let outcome = self.membership.request_join(&seed).await?;

        {
            let mut engine = self.engine.lock().await;
            for peer in &outcome.learned {
                engine.add_server(&peer.node_id);
            }
        }

        let announced_to = self.membership.announce_targets(&outcome.seed);
        let announcements = self
            .dispatcher
            .send_to_all(announced_to.clone(), self.membership.announcement());

        let installed = match self.bootstrap_from(&outcome.seed).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(
                    "Failed to recover state from {}: {}",
                    outcome.seed.node_id,
                    e
                );
                None
            }
        };

        Ok(Some(JoinReport {
            seed: outcome.seed,
            peers: outcome.learned,
            announced_to,
            installed,
            announcements,
        }))
    }

    /// Pulls and installs a full snapshot from `source`.
    pub async fn bootstrap_from(&self, source: &PeerIdentity) -> Result<InstallReport> {
        let snapshot = self.transfer.fetch(source).await?;
        let mut engine = self.engine.lock().await;
        Ok(StateTransferService::install(&mut engine, snapshot))
    }

    /// Spawns the retry loop, the periodic reconciliation and the stats reporter.
    pub fn start_background(self: &Arc<Self>) -> BackgroundTasks {
        let retry = self.dispatcher.start();

        let reconcile = self.config.reconcile_interval.map(|period| {
            let node = self.clone();
            tokio::spawn(async move {
                node.reconcile_loop(period).await;
            })
        });

        let stats = self.config.stats_interval.map(|period| {
            let node = self.clone();
            tokio::spawn(async move {
                node.stats_loop(period).await;
            })
        });

        BackgroundTasks {
            retry,
            reconcile,
            stats,
        }
    }

    async fn reconcile_loop(&self, period: std::time::Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let applied = self.engine.lock().await.reconcile();
            if applied > 0 {
                tracing::debug!("Periodic reconciliation applied {} updates", applied);
            }
        }
    }

    async fn stats_loop(&self, period: std::time::Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let (clock, pending) = {
                let engine = self.engine.lock().await;
                (engine.clock().clone(), engine.pending_len())
            };
            tracing::info!(
                "Node {} stats: {} peers, {} keys, {} buffered updates, {} queued messages, VC {}",
                self.identity.node_id,
                self.membership.directory.len(),
                self.store.len(),
                pending,
                self.dispatcher.outbound().total_len(),
                clock
            );
            for (peer, backlog) in self.dispatcher.outbound().backlog() {
                tracing::info!("  - {} has {} queued messages", peer.node_id, backlog);
            }
        }
    }

    // --- Diagnostics ---

    pub fn peers(&self) -> Vec<PeerIdentity> {
        self.membership.directory.peers()
    }

    pub async fn clock(&self) -> VectorClock {
        self.engine.lock().await.clock().clone()
    }

    pub async fn pending_updates(&self) -> usize {
        self.engine.lock().await.pending_len()
    }

    pub fn outbound(&self) -> &Arc<OutboundQueues> {
        self.dispatcher.outbound()
    }

    pub fn dispatcher(&self) -> &Arc<ReplicationDispatcher> {
        &self.dispatcher
    }
}
