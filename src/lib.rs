//! Sharded Key-Value Store Library
//!
//! Each process owns one shard of the key space and serves it from a local transactional store.
//! Writes are mirrored asynchronously to other nodes through a durable outbox.
//!
//! ## Architecture Modules
//! - **`config`**: Shard-list parsing and the immutable node settings.
//! - **`sharding`**: The `ShardTable` and the portable hash that decides which shard owns a key.
//! - **`storage`**: The `StorageEngine` contract with a primary region and a replication outbox,
//!   backed by fjall on disk or by ordered maps in memory.
//! - **`replication`**: The background puller that drains the outbox and pushes writes to their
//!   owners and replicas.
//! - **`server`**: The axum endpoints for reads, writes, replication and cleanup.

pub mod config;
pub mod replication;
pub mod server;
pub mod sharding;
pub mod storage;
