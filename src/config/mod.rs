//! Node Configuration
//!
//! Shard-list parsing and the immutable settings a node is started with.
//!
//! The shard list is a TOML file with one `[[shards]]` table per shard:
//!
//! ```toml
//! [[shards]]
//! name = "Moscow"
//! index = 0
//! address = "127.0.0.2:8080"
//! replicas = ["127.0.0.22:8080"]
//! ```

pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{NodeConfig, ReplicationSettings, Shard, ShardsFile};

use std::path::Path;

/// Parses a shard list from TOML text.
pub fn parse_shards(contents: &str, origin: &str) -> Result<ShardsFile, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}

/// Reads and parses the shard-list file at `path`.
pub fn load_shards(path: impl AsRef<Path>) -> Result<ShardsFile, ConfigError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: origin.clone(),
        source,
    })?;
    parse_shards(&contents, &origin)
}
