use super::protocol::{ENDPOINT_GET, ENDPOINT_SET, FORWARDED_HEADER};
use crate::config::Shard;
use crate::replication::protocol::base_url;
use crate::sharding::ShardTable;
use crate::storage::{Result as StorageResult, StorageEngine};

use anyhow::Result;
use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Request-side view of a shard: local storage plus routing to the other shards.
pub struct ShardNode {
    storage: Arc<dyn StorageEngine>,
    shards: Arc<ShardTable>,
    replication_wake: Arc<Notify>,
    http_client: reqwest::Client,
    forward_timeout: Duration,
}

/// Status and body returned by the shard a request was forwarded to.
#[derive(Debug)]
pub struct Forwarded {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Vec<u8>,
}

impl ShardNode {
    pub fn new(
        storage: Arc<dyn StorageEngine>,
        shards: Arc<ShardTable>,
        replication_wake: Arc<Notify>,
        forward_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            shards,
            replication_wake,
            http_client: reqwest::Client::new(),
            forward_timeout,
        }
    }

    pub fn shards(&self) -> &ShardTable {
        &self.shards
    }

    pub fn storage(&self) -> &dyn StorageEngine {
        self.storage.as_ref()
    }

    /// Writes a key this shard owns and nudges the puller.
    pub fn set_local(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.storage.set_key(key, value)?;
        self.replication_wake.notify_one();
        Ok(())
    }

    pub fn get_local(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.storage.get_key(key)
    }

    /// Applies a write pushed by another node.
    ///
    /// A writable owner with replicas queues the write again so it reaches
    /// them. Replicas are read-only, so the write stops there.
    pub fn apply_replicated(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if self.relays_to_replicas(key) {
            return self.set_local(key, value);
        }
        self.storage.apply_replicated(key, value)
    }

    fn relays_to_replicas(&self, key: &[u8]) -> bool {
        !self.storage.is_read_only()
            && self.shards.is_owned_by_me(key)
            && !self.shards.self_shard().replicas.is_empty()
    }

    /// Removes every record that belongs to another shard.
    pub fn purge(&self) -> StorageResult<usize> {
        let deleted = self
            .storage
            .delete_keys_not_owned(&|key: &[u8]| self.shards.is_extra(key))?;
        tracing::info!("Purged {} keys not owned by this shard", deleted);
        Ok(deleted)
    }

    pub async fn forward_get(&self, owner: &Shard, key: &str) -> Result<Forwarded> {
        self.forward(owner, Method::GET, ENDPOINT_GET, &[("key", key)])
            .await
    }

    pub async fn forward_set(&self, owner: &Shard, key: &str, value: &str) -> Result<Forwarded> {
        self.forward(
            owner,
            Method::POST,
            ENDPOINT_SET,
            &[("key", key), ("value", value)],
        )
        .await
    }

    async fn forward(
        &self,
        owner: &Shard,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Forwarded> {
        let url = format!("{}{}", base_url(&owner.address), endpoint);
        tracing::debug!("Forwarding {} to shard {} at {}", endpoint, owner.index, url);

        let response = self
            .http_client
            .request(method, url)
            .query(query)
            .header(FORWARDED_HEADER, "1")
            .timeout(self.forward_timeout)
            .send()
            .await?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?.to_vec();
        Ok(Forwarded {
            status,
            content_type,
            body,
        })
    }
}
