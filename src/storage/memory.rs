//! In-memory storage backend.
//!
//! Both regions live behind a single `RwLock`, so a write transaction is the
//! span of one write guard: readers either see all of its effects or none.

use super::engine::{OutboxEntry, StorageEngine};
use super::error::{Result, StorageError};

use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Regions {
    primary: BTreeMap<Vec<u8>, Vec<u8>>,
    outbox: BTreeMap<Vec<u8>, Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    regions: RwLock<Regions>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new(read_only: bool) -> Self {
        Self {
            regions: RwLock::new(Regions::default()),
            read_only,
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

impl StorageEngine for MemoryStore {
    fn set_key(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        check_key(key)?;

        let mut regions = self.regions.write();
        regions.primary.insert(key.to_vec(), value.to_vec());
        regions.outbox.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get_key(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.regions.read().primary.get(key).cloned())
    }

    fn peek_oldest_outbox_entry(&self) -> Result<Option<OutboxEntry>> {
        let regions = self.regions.read();
        Ok(regions
            .outbox
            .first_key_value()
            .map(|(key, value)| OutboxEntry::new(key.clone(), value.clone())))
    }

    fn ack_outbox_entry(&self, key: &[u8], expected_value: &[u8]) -> Result<()> {
        let mut regions = self.regions.write();
        match regions.outbox.get(key) {
            None => Err(StorageError::NotFound),
            Some(current) if current.as_slice() != expected_value => Err(StorageError::Conflict),
            Some(_) => {
                regions.outbox.remove(key);
                Ok(())
            }
        }
    }

    fn delete_keys_not_owned(&self, is_extra: &dyn Fn(&[u8]) -> bool) -> Result<usize> {
        let extra: Vec<Vec<u8>> = {
            let regions = self.regions.read();
            regions
                .primary
                .keys()
                .filter(|key| is_extra(key.as_slice()))
                .cloned()
                .collect()
        };

        let mut regions = self.regions.write();
        for key in &extra {
            regions.primary.remove(key);
        }
        Ok(extra.len())
    }

    fn apply_replicated(&self, key: &[u8], value: &[u8]) -> Result<()> {
        check_key(key)?;
        self.regions
            .write()
            .primary
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn outbox_len(&self) -> Result<usize> {
        Ok(self.regions.read().outbox.len())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
