use axum::{Extension, Json, extract::rejection::JsonRejection, response::Response};
use std::sync::Arc;

use crate::node::Node;
use crate::node::server::dispatch_inbound;
use crate::transport::{Channel, Message};

/// Receives one `Update`. Replies `204` once the update has been applied,
/// buffered or discarded.
pub async fn handle_replicate(
    Extension(node): Extension<Arc<Node>>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    dispatch_inbound(&node, Channel::Replication, payload).await
}
