//! Local Storage Module
//!
//! Transactional key/value storage for a single shard.
//!
//! ## Core Concepts
//! - **Regions**: every store holds a primary region (`"default"`) with the shard's records and an
//!   outbox region (`"replication"`) with writes that still have to reach other nodes.
//! - **Atomic enqueue**: `set_key` updates both regions in one transaction, so a committed write
//!   always has a pending outbox entry until it is acknowledged.
//! - **Backends**: `FjallStore` persists to disk, `MemoryStore` keeps everything in ordered maps.

pub mod disk;
pub mod engine;
pub mod error;
pub mod memory;

pub use disk::FjallStore;
pub use engine::{OUTBOX_REGION, OutboxEntry, PRIMARY_REGION, StorageEngine};
pub use error::{Result, StorageError};
pub use memory::MemoryStore;

#[cfg(test)]
mod tests;
