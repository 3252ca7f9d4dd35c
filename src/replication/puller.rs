//! Outbox Puller
//!
//! Drains the local outbox in the background. Each iteration peeks the pending entry with the
//! smallest key, pushes it to every node that has to receive it and acknowledges it locally once
//! all of them confirmed.
//!
//! ## Delivery Guarantees
//! - **At-least-once**: an entry stays in the outbox until acknowledged, so a failed or
//!   interrupted push is simply retried on a later iteration.
//! - **No lost updates**: the acknowledgment carries the value that was pushed. If a newer write
//!   replaced it meanwhile, the ack fails with `Conflict` and the newer value is pushed next.

use super::client::ReplicaClient;
use crate::config::ReplicationSettings;
use crate::sharding::ShardTable;
use crate::storage::{StorageEngine, StorageError};

use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a single puller iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The outbox was empty.
    Idle,
    /// An entry was pushed and acknowledged.
    Delivered,
    /// An entry was pushed but a newer write had replaced it.
    Superseded,
    /// Delivery or local storage failed; the entry is still pending.
    Failed,
}

pub struct ReplicationPuller {
    storage: Arc<dyn StorageEngine>,
    shards: Arc<ShardTable>,
    client: Arc<dyn ReplicaClient>,
    settings: ReplicationSettings,
    wake: Arc<Notify>,
}

impl ReplicationPuller {
    pub fn new(
        storage: Arc<dyn StorageEngine>,
        shards: Arc<ShardTable>,
        client: Arc<dyn ReplicaClient>,
        settings: ReplicationSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage,
            shards,
            client,
            settings,
            wake: Arc::new(Notify::new()),
        })
    }

    /// Signal that cuts the idle sleep short. Notified after local writes.
    pub fn waker(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Spawns the pull loop and returns a handle that stops it.
    pub fn start(self: Arc<Self>) -> PullerHandle {
        let cancel = CancellationToken::new();
        let wake = self.waker();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                self.pull_loop(cancel).await;
            })
        };

        PullerHandle { cancel, wake, task }
    }

    async fn pull_loop(&self, cancel: CancellationToken) {
        tracing::info!(
            "Replication puller started for shard {} ({} of {})",
            self.shards.self_shard().name,
            self.shards.self_index(),
            self.shards.count()
        );

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.run_once() => outcome,
            };

            let pause = match outcome {
                PullOutcome::Idle => self.settings.poll_interval,
                PullOutcome::Failed => self.settings.retry_interval,
                PullOutcome::Delivered | PullOutcome::Superseded => continue,
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.wake.notified(), if outcome == PullOutcome::Idle => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("Replication puller stopped");
    }

    /// Runs one peek, push, ack cycle.
    pub async fn run_once(&self) -> PullOutcome {
        let entry = match self.storage.peek_oldest_outbox_entry() {
            Ok(Some(entry)) => entry,
            Ok(None) => return PullOutcome::Idle,
            Err(e) => {
                tracing::error!("Failed to read replication outbox: {}", e);
                return PullOutcome::Failed;
            }
        };
        let key_repr = String::from_utf8_lossy(&entry.key);

        let targets = self.shards.replication_targets(&entry.key);
        if targets.is_empty() {
            tracing::trace!("No replication targets for {:?}, acknowledging", key_repr);
        }

        for address in &targets {
            if let Err(e) = self.client.push(address, &entry.key, &entry.value).await {
                tracing::warn!("Failed to replicate {:?} to {}: {}", key_repr, address, e);
                return PullOutcome::Failed;
            }
            tracing::debug!("Replicated {:?} to {}", key_repr, address);
        }

        match self.storage.ack_outbox_entry(&entry.key, &entry.value) {
            Ok(()) => PullOutcome::Delivered,
            Err(StorageError::Conflict) => {
                tracing::debug!("Key {:?} was overwritten during replication", key_repr);
                PullOutcome::Superseded
            }
            Err(StorageError::NotFound) => {
                tracing::warn!("Replication entry for {:?} disappeared before ack", key_repr);
                PullOutcome::Superseded
            }
            Err(e) => {
                tracing::error!("Failed to acknowledge {:?}: {}", key_repr, e);
                PullOutcome::Failed
            }
        }
    }
}

/// Owner of a running puller task.
pub struct PullerHandle {
    cancel: CancellationToken,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PullerHandle {
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    pub fn waker(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// A push in flight is abandoned; its entry stays in the outbox.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Replication puller task failed: {}", e);
        }
    }
}
