//! In-memory `PeerTransport` for multi-node tests.
//!
//! Routes each exchange straight into the target node's dispatcher, keyed by
//! `(host, port)`, so whole clusters run inside one test without sockets.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Mutex, Weak};

use super::node::Node;
use crate::error::TransportError;
use crate::transport::{Channel, Endpoint, Message, PeerTransport};

#[derive(Default)]
pub(crate) struct LoopbackTransport {
    routes: DashMap<(String, u16), (Weak<Node>, Channel)>,
    offline: DashSet<String>,
    sent: Mutex<Vec<(Endpoint, Message)>>,
}

impl LoopbackTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the node's three inter-node endpoints reachable.
    pub(crate) fn register(&self, node: &Arc<Node>) {
        let identity = node.identity();
        for channel in [Channel::Replication, Channel::Discovery, Channel::StateTransfer] {
            self.routes.insert(
                (identity.host.clone(), identity.port_for(channel)),
                (Arc::downgrade(node), channel),
            );
        }
    }

    /// Drops a single endpoint, leaving the node's other channels reachable.
    pub(crate) fn unregister(&self, host: &str, port: u16) {
        self.routes.remove(&(host.to_string(), port));
    }

    pub(crate) fn set_offline(&self, host: &str) {
        self.offline.insert(host.to_string());
    }

    pub(crate) fn set_online(&self, host: &str) {
        self.offline.remove(host);
    }

    /// Every message that reached a live node, in delivery order.
    pub(crate) fn sent(&self) -> Vec<(Endpoint, Message)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub(crate) fn sent_to(&self, host: &str) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|(endpoint, _)| endpoint.host == host)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        message: Message,
    ) -> Result<Option<Message>, TransportError> {
        let unreachable = |reason: &str| TransportError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        if self.offline.contains(&endpoint.host) {
            return Err(unreachable("host offline"));
        }
        let (node, channel) = match self.routes.get(&(endpoint.host.clone(), endpoint.port)) {
            Some(route) => route.value().clone(),
            None => return Err(unreachable("connection refused")),
        };
        let node = node.upgrade().ok_or_else(|| unreachable("node dropped"))?;

        if let Ok(mut sent) = self.sent.lock() {
            sent.push((endpoint.clone(), message.clone()));
        }

        node.handle_on_channel(channel, message)
            .await
            .map_err(|_| TransportError::Rejected {
                endpoint: endpoint.to_string(),
                status: 400,
            })
    }
}
