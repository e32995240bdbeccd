use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{DumpEntry, GetResponse, PutRequest, PutResponse};
use crate::node::Node;

pub async fn handle_put(
    Extension(node): Extension<Arc<Node>>,
    Json(req): Json<PutRequest>,
) -> (StatusCode, Json<PutResponse>) {
    if req.key.trim().is_empty() {
        tracing::warn!("Rejected write with empty key");
        return (
            StatusCode::BAD_REQUEST,
            Json(PutResponse {
                success: false,
                clock: None,
                error: Some("key must not be empty".to_string()),
            }),
        );
    }

    let receipt = node.put(&req.key, &req.value).await;

    (
        StatusCode::OK,
        Json(PutResponse {
            success: true,
            clock: Some(receipt.clock),
            error: None,
        }),
    )
}

pub async fn handle_get(
    Extension(node): Extension<Arc<Node>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<GetResponse>) {
    match node.get(&key) {
        Some(value) => (
            StatusCode::OK,
            Json(GetResponse {
                key,
                value: Some(value),
                error: None,
            }),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(GetResponse {
                key,
                value: None,
                error: Some("key not found".to_string()),
            }),
        ),
    }
}

pub async fn handle_dump(Extension(node): Extension<Arc<Node>>) -> (StatusCode, Json<Vec<DumpEntry>>) {
    let entries = node
        .snapshot()
        .await
        .into_iter()
        .map(|(key, entry)| DumpEntry {
            key,
            value: entry.value,
            clock: entry.clock,
        })
        .collect();

    (StatusCode::OK, Json(entries))
}
