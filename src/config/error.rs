use thiserror::Error;

/// A malformed or inconsistent node configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("no shards configured")]
    NoShards,

    #[error("duplicate shard name {0:?}")]
    DuplicateName(String),

    #[error("duplicate shard index {0}")]
    DuplicateIndex(usize),

    #[error("shard indices must be 0..{count}, found index {index}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("shard {0:?} was not found in the config")]
    UnknownShard(String),
}
