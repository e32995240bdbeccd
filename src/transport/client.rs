use async_trait::async_trait;
use std::time::Duration;

use super::protocol::{Endpoint, Message};
use crate::error::TransportError;

/// Outbound side of the inter-node channels.
///
/// One call is one exchange: the message is delivered on its own request and
/// the peer's reply, if the channel has one, is handed back.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        message: Message,
    ) -> Result<Option<Message>, TransportError>;
}

/// `PeerTransport` over HTTP, one POST per exchange with a JSON body.
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn exchange(
        &self,
        endpoint: &Endpoint,
        message: Message,
    ) -> Result<Option<Message>, TransportError> {
        let response = self
            .http_client
            .post(endpoint.url())
            .json(&message)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TransportError::Rejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let reply: Message = response
            .json()
            .await
            .map_err(|e| TransportError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Received {} from {}", reply.kind(), endpoint);
        Ok(Some(reply))
    }
}
