//! Replication Network Protocol
//!
//! The single internode call used to mirror writes: a push of one `(key, value)` pair
//! to the receiver's apply endpoint.

use serde::{Deserialize, Serialize};

/// Endpoint that applies a replicated write as a plain overwrite.
pub const ENDPOINT_REPLICATE: &str = "/replicate";

/// Payload of a push. Keys and values travel as raw bytes.
///
/// Applying the same request twice leaves the receiver unchanged, which is
/// what makes redelivery after a lost response safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Acknowledgment of a push.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub success: bool,
}

/// Turns a configured `host:port` address into a base URL.
pub fn base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}
