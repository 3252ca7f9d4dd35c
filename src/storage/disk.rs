//! Persistent storage backend on a fjall transactional keyspace.
//!
//! Each region is a fjall partition. Writes go through the keyspace's
//! single-writer transactions, reads through snapshot read transactions.

use super::engine::{OUTBOX_REGION, OutboxEntry, PRIMARY_REGION, StorageEngine};
use super::error::{Result, StorageError};

use fjall::{
    Config, PartitionCreateOptions, PersistMode, ReadTransaction, TxKeyspace, TxPartitionHandle,
    WriteTransaction,
};
use std::path::Path;

pub struct FjallStore {
    keyspace: TxKeyspace,
    primary: TxPartitionHandle,
    outbox: TxPartitionHandle,
    read_only: bool,
}

impl FjallStore {
    pub fn open(path: impl AsRef<Path>, read_only: bool) -> Result<Self> {
        Self::open_with_fsync(path, read_only, None)
    }

    /// Opens the store, creating both regions if they do not exist yet.
    ///
    /// `fsync_ms` enables periodic journal fsync in addition to the sync
    /// performed on drop.
    pub fn open_with_fsync(
        path: impl AsRef<Path>,
        read_only: bool,
        fsync_ms: Option<u16>,
    ) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut config = Config::new(path);
        if let Some(ms) = fsync_ms
            && ms > 0
        {
            config = config.fsync_ms(Some(ms));
        }
        let keyspace = config.open_transactional()?;

        let primary = keyspace.open_partition(PRIMARY_REGION, PartitionCreateOptions::default())?;
        let outbox = keyspace.open_partition(OUTBOX_REGION, PartitionCreateOptions::default())?;

        tracing::info!(
            "Opened store at {} (read_only={})",
            path.display(),
            read_only
        );

        Ok(Self {
            keyspace,
            primary,
            outbox,
            read_only,
        })
    }

    /// Runs `f` inside a read transaction.
    fn view<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T>) -> Result<T> {
        let tx = self.keyspace.read_tx();
        f(&tx)
    }

    /// Runs `f` inside a write transaction, committing only if it returns `Ok`.
    ///
    /// Any other exit (error or unwinding) drops the transaction uncommitted.
    fn update<T>(&self, f: impl FnOnce(&mut WriteTransaction) -> Result<T>) -> Result<T> {
        let mut tx = self.keyspace.write_tx();
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        Ok(())
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::EmptyKey);
    }
    Ok(())
}

impl StorageEngine for FjallStore {
    fn set_key(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        check_key(key)?;

        self.update(|tx| {
            tx.insert(&self.primary, key, value);
            tx.insert(&self.outbox, key, value);
            Ok(())
        })
    }

    fn get_key(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.view(|tx| Ok(tx.get(&self.primary, key)?.map(|value| value.to_vec())))
    }

    fn peek_oldest_outbox_entry(&self) -> Result<Option<OutboxEntry>> {
        self.view(|tx| {
            Ok(tx
                .first_key_value(&self.outbox)?
                .map(|(key, value)| OutboxEntry::new(key.to_vec(), value.to_vec())))
        })
    }

    fn ack_outbox_entry(&self, key: &[u8], expected_value: &[u8]) -> Result<()> {
        self.update(|tx| {
            let current = tx.get(&self.outbox, key)?.ok_or(StorageError::NotFound)?;
            if &*current != expected_value {
                return Err(StorageError::Conflict);
            }
            tx.remove(&self.outbox, key);
            Ok(())
        })
    }

    fn delete_keys_not_owned(&self, is_extra: &dyn Fn(&[u8]) -> bool) -> Result<usize> {
        let extra = self.view(|tx| {
            let mut keys = Vec::new();
            for item in tx.iter(&self.primary) {
                let (key, _) = item?;
                if is_extra(&key) {
                    keys.push(key.to_vec());
                }
            }
            Ok(keys)
        })?;

        self.update(|tx| {
            for key in &extra {
                tx.remove(&self.primary, key.as_slice());
            }
            Ok(extra.len())
        })
    }

    fn apply_replicated(&self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        self.update(|tx| {
            tx.insert(&self.primary, key, value);
            Ok(())
        })
    }

    fn outbox_len(&self) -> Result<usize> {
        self.view(|tx| Ok(tx.len(&self.outbox)?))
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl Drop for FjallStore {
    fn drop(&mut self) {
        if let Err(e) = self.keyspace.persist(PersistMode::SyncAll) {
            tracing::error!("Failed to persist store on close: {}", e);
        }
    }
}
