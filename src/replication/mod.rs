//! Asynchronous Replication Module
//!
//! Mirrors committed writes to the nodes that have to hold them, using the storage outbox as a
//! durable queue.
//!
//! ## Architecture Overview
//! 1. **Enqueue**: `StorageEngine::set_key` writes the record and its outbox entry in one transaction.
//! 2. **Pull**: the `ReplicationPuller` task peeks the oldest (smallest key) pending entry.
//! 3. **Push**: the entry is sent to the owning shard, or to this shard's replicas when the key is
//!    owned locally, through a `ReplicaClient`.
//! 4. **Ack**: once every target confirmed, the entry is removed if it still holds the pushed value.
//!
//! ## Submodules
//! - **`puller`**: the background loop and its shutdown handle.
//! - **`client`**: transport abstraction and its HTTP implementation.
//! - **`protocol`**: the wire contract of the apply endpoint.

pub mod client;
pub mod protocol;
pub mod puller;

pub use client::{HttpReplicaClient, ReplicaClient};
pub use puller::{PullOutcome, PullerHandle, ReplicationPuller};
