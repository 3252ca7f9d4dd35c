use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures surfaced by a [`StorageEngine`](super::engine::StorageEngine).
///
/// `NotFound` and `Conflict` are only produced by outbox acknowledgment; a
/// missing primary key is reported as `Ok(None)` by `get_key`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("read only mode")]
    ReadOnly,

    #[error("key must not be empty")]
    EmptyKey,

    #[error("replication entry does not exist")]
    NotFound,

    /// A newer write replaced the pending value after it was peeked.
    #[error("replication entry value does not match")]
    Conflict,

    #[error("storage backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
