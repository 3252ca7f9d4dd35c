//! Client-facing HTTP contract.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_GET: &str = "/get";
pub const ENDPOINT_SET: &str = "/set";
/// Deletes records that belong to other shards.
pub const ENDPOINT_PURGE: &str = "/purge";
pub const ENDPOINT_STATS: &str = "/stats";

/// Marks a request that was already routed once, so it is never forwarded again.
pub const FORWARDED_HEADER: &str = "x-shardkv-forwarded";

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyParams {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetParams {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub success: bool,
    /// Index of the shard that handled the write.
    pub shard: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub shard: String,
    pub index: usize,
    pub shard_count: usize,
    pub read_only: bool,
    pub pending_replication: usize,
}
