//! Client Channel Protocol
//!
//! Request and response bodies of the client-facing adapter. Clients read,
//! write and dump the local replica; they never see inter-node messages.

use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;

// --- API Endpoints ---

/// Read one key: `GET /get/:key`.
pub const ENDPOINT_GET: &str = "/get";
/// Write one key: `POST /put`.
pub const ENDPOINT_PUT: &str = "/put";
/// Every entry with its clock, ordered by key: `GET /dump`.
pub const ENDPOINT_DUMP: &str = "/dump";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutResponse {
    pub success: bool,
    /// The node's clock right after the write.
    pub clock: Option<VectorClock>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub key: String,
    /// `None` means the key does not exist on this replica.
    pub value: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DumpEntry {
    pub key: String,
    pub value: String,
    pub clock: VectorClock,
}
