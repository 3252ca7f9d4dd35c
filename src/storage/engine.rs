use super::error::Result;

/// Region holding the authoritative key/value records of this shard.
pub const PRIMARY_REGION: &str = "default";
/// Region holding writes that still have to be pushed to other nodes.
pub const OUTBOX_REGION: &str = "replication";

/// A pending replication entry, owned so it outlives the read transaction
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl OutboxEntry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Transactional, ordered store with a primary region and an outbox region
/// sharing one commit unit.
///
/// Implementations allow at most one write transaction at a time and never
/// expose a partially applied write to readers.
pub trait StorageEngine: Send + Sync {
    /// Writes `primary[key] = value` and `outbox[key] = value` atomically.
    fn set_key(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn get_key(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Returns the pending entry with the smallest key.
    fn peek_oldest_outbox_entry(&self) -> Result<Option<OutboxEntry>>;

    /// Deletes the outbox entry for `key` if it still holds `expected_value`.
    ///
    /// Fails with `NotFound` when no entry exists and with `Conflict` when the
    /// stored value differs; the entry is left untouched in both cases.
    fn ack_outbox_entry(&self, key: &[u8], expected_value: &[u8]) -> Result<()>;

    /// Scans the primary region, then deletes every key `is_extra` selected
    /// during the scan. Returns the number of deleted keys.
    ///
    /// The scan and the delete run in separate transactions, so a key
    /// rewritten in between is still deleted. Permitted on read-only handles.
    fn delete_keys_not_owned(&self, is_extra: &dyn Fn(&[u8]) -> bool) -> Result<usize>;

    /// Overwrites `primary[key]` with a value received from another node.
    ///
    /// Nothing is enqueued in the outbox. Permitted on read-only handles.
    fn apply_replicated(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn outbox_len(&self) -> Result<usize>;

    fn is_read_only(&self) -> bool;
}
