use axum::{Extension, Json, extract::rejection::JsonRejection, response::Response};
use std::sync::Arc;

use crate::node::Node;
use crate::node::server::dispatch_inbound;
use crate::transport::{Channel, Message};

/// Discovery endpoint: `JoinRequest` gets a `JoinResponse`, `NewPeerAnnounce`
/// gets an empty `204`.
pub async fn handle_discovery(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    dispatch_inbound(&node, Channel::Discovery, payload).await
}
