//! Shard Ownership
//!
//! Maps every key to exactly one shard of a statically configured cluster.
//!
//! ## Core Concepts
//! - **Ownership**: `owner_index(key) = fnv1_64(key) % N`, identical on every node.
//! - **Routing**: requests for foreign keys are forwarded to the owner's address.
//! - **Cleanup**: `is_extra` selects keys left behind after the shard list changed.

pub mod hash;
pub mod table;

pub use hash::fnv1_64;
pub use table::ShardTable;
