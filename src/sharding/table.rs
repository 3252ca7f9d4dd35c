use super::hash::fnv1_64;
use crate::config::{ConfigError, Shard};

use std::collections::HashSet;

/// Immutable view of the cluster's shards, built once at startup.
#[derive(Debug, Clone)]
pub struct ShardTable {
    /// Sorted by index, so `shards[i].index == i`.
    shards: Vec<Shard>,
    self_index: usize,
}

impl ShardTable {
    /// Validates `shards` and locates this node's shard by `self_name`.
    ///
    /// Indices must be exactly `0..N` and names unique.
    pub fn build(shards: Vec<Shard>, self_name: &str) -> Result<Self, ConfigError> {
        if shards.is_empty() {
            return Err(ConfigError::NoShards);
        }

        let count = shards.len();
        let mut names = HashSet::with_capacity(count);
        let mut slots: Vec<Option<Shard>> = vec![None; count];

        for shard in shards {
            if !names.insert(shard.name.clone()) {
                return Err(ConfigError::DuplicateName(shard.name));
            }
            if shard.index >= count {
                return Err(ConfigError::IndexOutOfRange {
                    index: shard.index,
                    count,
                });
            }
            let index = shard.index;
            if slots[index].replace(shard).is_some() {
                return Err(ConfigError::DuplicateIndex(index));
            }
        }

        // N distinct indices below N cover every slot.
        let shards: Vec<Shard> = slots.into_iter().flatten().collect();

        let self_index = shards
            .iter()
            .find(|shard| shard.name == self_name)
            .map(|shard| shard.index)
            .ok_or_else(|| ConfigError::UnknownShard(self_name.to_string()))?;

        Ok(Self { shards, self_index })
    }

    pub fn count(&self) -> usize {
        self.shards.len()
    }

    pub fn self_index(&self) -> usize {
        self.self_index
    }

    pub fn self_shard(&self) -> &Shard {
        &self.shards[self.self_index]
    }

    /// Index of the shard that owns `key`.
    pub fn owner_index(&self, key: &[u8]) -> usize {
        (fnv1_64(key) % self.shards.len() as u64) as usize
    }

    pub fn owner(&self, key: &[u8]) -> &Shard {
        &self.shards[self.owner_index(key)]
    }

    pub fn is_owned_by_me(&self, key: &[u8]) -> bool {
        self.owner_index(key) == self.self_index
    }

    /// True for keys that belong to another shard. Only used by cleanup.
    pub fn is_extra(&self, key: &[u8]) -> bool {
        !self.is_owned_by_me(key)
    }

    /// Nodes a pending write for `key` has to reach.
    ///
    /// A foreign key goes to its owner; an owned key goes to this shard's
    /// replicas, which may be none.
    pub fn replication_targets(&self, key: &[u8]) -> Vec<String> {
        let owner = self.owner(key);
        if owner.index == self.self_index {
            owner.replicas.clone()
        } else {
            vec![owner.address.clone()]
        }
    }
}
