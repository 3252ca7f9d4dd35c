use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One entry of the shard list.
///
/// `replicas` lists read-only nodes that mirror this shard; it may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub name: String,
    pub index: usize,
    pub address: String,
    #[serde(default)]
    pub replicas: Vec<String>,
}

/// Contents of the shard-list file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardsFile {
    #[serde(default)]
    pub shards: Vec<Shard>,
}

/// Replication timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationSettings {
    /// Sleep between outbox polls when the outbox is empty.
    pub poll_interval: Duration,
    /// Back-off after a failed delivery.
    pub retry_interval: Duration,
    /// Timeout of a single push to a remote node.
    pub push_timeout: Duration,
    /// Attempts per push before the delivery counts as failed.
    pub push_attempts: usize,
    /// Pause before the second attempt; doubled after each further failure.
    pub backoff_initial: Duration,
    /// Upper bound of the pause between attempts.
    pub backoff_max: Duration,
}

impl Default for ReplicationSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            retry_interval: Duration::from_secs(1),
            push_timeout: Duration::from_millis(500),
            push_attempts: 3,
            backoff_initial: Duration::from_millis(150),
            backoff_max: Duration::from_millis(1200),
        }
    }
}

/// Everything a node needs at startup, resolved once and passed by value.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub db_location: PathBuf,
    pub http_addr: String,
    pub shard_name: String,
    pub config_file: PathBuf,
    pub read_only: bool,
    pub fsync_ms: Option<u16>,
    pub replication: ReplicationSettings,
}
