use super::protocol::{ENDPOINT_REPLICATE, ReplicateRequest, ReplicateResponse, base_url};
use crate::config::ReplicationSettings;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Transport used by the puller to deliver a write to another node.
#[async_trait]
pub trait ReplicaClient: Send + Sync {
    /// Pushes `(key, value)` to the node at `address`. `Ok` means the remote
    /// side applied the write.
    async fn push(&self, address: &str, key: &[u8], value: &[u8]) -> Result<()>;
}

/// Pushes over HTTP with a bounded number of retries.
pub struct HttpReplicaClient {
    http_client: reqwest::Client,
    timeout: Duration,
    attempts: usize,
    backoff_initial: Duration,
    backoff_max: Duration,
}

impl HttpReplicaClient {
    pub fn new(settings: &ReplicationSettings) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout: settings.push_timeout,
            attempts: settings.push_attempts.max(1),
            backoff_initial: settings.backoff_initial,
            backoff_max: settings.backoff_max,
        }
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
    ) -> Result<reqwest::Response> {
        let mut delay = self.backoff_initial;

        for attempt in 0..self.attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == self.attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = Duration::from_millis(rand::random::<u64>() % 50);
                    tracing::debug!(
                        "Push to {} failed (attempt {}): {}, retrying in {:?}",
                        url,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay + jitter).await;
                    delay = (delay * 2).min(self.backoff_max);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl ReplicaClient for HttpReplicaClient {
    async fn push(&self, address: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let payload = ReplicateRequest {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        let response = self
            .post_with_retry(format!("{}{}", base_url(address), ENDPOINT_REPLICATE), &payload)
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Replication failed: {}", response.status()));
        }

        let ack: ReplicateResponse = response.json().await?;
        if !ack.success {
            return Err(anyhow::anyhow!("Replica {} rejected the write", address));
        }
        Ok(())
    }
}
