use axum::{Extension, Json, extract::rejection::JsonRejection, response::Response};
use std::sync::Arc;

use crate::node::Node;
use crate::node::server::dispatch_inbound;
use crate::transport::{Channel, Message};

/// Answers `StateRequest` with the node's current snapshot.
pub async fn handle_state_request(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    dispatch_inbound(&node, Channel::StateTransfer, payload).await
}
