//! Storage Module Tests
//!
//! Validates the transaction contract of both storage backends.
//!
//! ## Test Scopes
//! - **Records**: Round-trips, overwrites and read-only handles.
//! - **Outbox**: Atomic enqueue, key ordering, acknowledgment outcomes.
//! - **Cleanup**: Removal of keys selected by the ownership predicate.
//! - **Persistence**: Data and pending entries survive reopening the on-disk store.

#[cfg(test)]
mod tests {
    use crate::storage::{FjallStore, MemoryStore, OutboxEntry, StorageEngine, StorageError};
    use tempfile::TempDir;

    fn open_disk(dir: &TempDir, read_only: bool) -> FjallStore {
        FjallStore::open(dir.path().join("db"), read_only).unwrap()
    }

    /// Runs `check` against a fresh writable handle of every backend.
    fn for_each_backend(check: impl Fn(&dyn StorageEngine)) {
        let memory = MemoryStore::new(false);
        check(&memory);

        let dir = TempDir::new().unwrap();
        let disk = open_disk(&dir, false);
        check(&disk);
    }

    // ============================================================
    // RECORD TESTS
    // ============================================================

    #[test]
    fn test_set_then_get_returns_value() {
        for_each_backend(|store| {
            store.set_key(b"alice", b"v1").unwrap();
            assert_eq!(store.get_key(b"alice").unwrap(), Some(b"v1".to_vec()));
        });
    }

    #[test]
    fn test_get_missing_key_is_none() {
        for_each_backend(|store| {
            assert_eq!(store.get_key(b"nobody").unwrap(), None);
        });
    }

    #[test]
    fn test_empty_key_is_rejected() {
        for_each_backend(|store| {
            let result = store.set_key(b"", b"v");
            assert!(matches!(result, Err(StorageError::EmptyKey)));
            assert_eq!(store.outbox_len().unwrap(), 0);
        });
    }

    #[test]
    fn test_empty_value_is_stored() {
        for_each_backend(|store| {
            store.set_key(b"k", b"").unwrap();
            assert_eq!(store.get_key(b"k").unwrap(), Some(Vec::new()));
        });
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let memory = MemoryStore::new(true);
        let dir = TempDir::new().unwrap();
        let disk = open_disk(&dir, true);

        let stores: [&dyn StorageEngine; 2] = [&memory, &disk];
        for store in stores {
            assert!(store.is_read_only());
            let result = store.set_key(b"k", b"v");
            assert!(matches!(result, Err(StorageError::ReadOnly)));

            // Reads still work and nothing was written
            assert_eq!(store.get_key(b"k").unwrap(), None);
            assert_eq!(store.peek_oldest_outbox_entry().unwrap(), None);
        }
    }

    #[test]
    fn test_read_only_accepts_replicated_writes() {
        let store = MemoryStore::new(true);

        store.apply_replicated(b"k", b"v").unwrap();

        assert_eq!(store.get_key(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(
            store.outbox_len().unwrap(),
            0,
            "Replicated writes must not be enqueued again"
        );
    }

    #[test]
    fn test_apply_replicated_is_idempotent() {
        for_each_backend(|store| {
            store.apply_replicated(b"k", b"v").unwrap();
            store.apply_replicated(b"k", b"v").unwrap();
            assert_eq!(store.get_key(b"k").unwrap(), Some(b"v".to_vec()));
            assert_eq!(store.outbox_len().unwrap(), 0);
        });
    }

    // ============================================================
    // OUTBOX TESTS
    // ============================================================

    #[test]
    fn test_set_enqueues_outbox_entry() {
        for_each_backend(|store| {
            store.set_key(b"alice", b"v1").unwrap();
            assert_eq!(
                store.peek_oldest_outbox_entry().unwrap(),
                Some(OutboxEntry::new("alice", "v1"))
            );
        });
    }

    #[test]
    fn test_overwrite_keeps_single_outbox_entry() {
        for_each_backend(|store| {
            store.set_key(b"k", b"v1").unwrap();
            store.set_key(b"k", b"v2").unwrap();

            assert_eq!(store.outbox_len().unwrap(), 1);
            assert_eq!(
                store.peek_oldest_outbox_entry().unwrap(),
                Some(OutboxEntry::new("k", "v2"))
            );
            assert_eq!(store.get_key(b"k").unwrap(), Some(b"v2".to_vec()));
        });
    }

    #[test]
    fn test_peek_returns_smallest_key() {
        for_each_backend(|store| {
            store.set_key(b"zeta", b"1").unwrap();
            store.set_key(b"alpha", b"2").unwrap();
            store.set_key(b"mid", b"3").unwrap();

            let entry = store.peek_oldest_outbox_entry().unwrap().unwrap();
            assert_eq!(entry.key, b"alpha".to_vec());
        });
    }

    #[test]
    fn test_peek_on_empty_outbox() {
        for_each_backend(|store| {
            assert_eq!(store.peek_oldest_outbox_entry().unwrap(), None);
        });
    }

    #[test]
    fn test_ack_removes_matching_entry() {
        for_each_backend(|store| {
            store.set_key(b"alice", b"v1").unwrap();

            store.ack_outbox_entry(b"alice", b"v1").unwrap();

            assert_eq!(store.peek_oldest_outbox_entry().unwrap(), None);
            // The record itself is untouched
            assert_eq!(store.get_key(b"alice").unwrap(), Some(b"v1".to_vec()));
        });
    }

    #[test]
    fn test_ack_stale_value_conflicts() {
        for_each_backend(|store| {
            store.set_key(b"k", b"v1").unwrap();
            store.set_key(b"k", b"v2").unwrap();

            let result = store.ack_outbox_entry(b"k", b"v1");

            assert!(matches!(result, Err(StorageError::Conflict)));
            assert_eq!(
                store.peek_oldest_outbox_entry().unwrap(),
                Some(OutboxEntry::new("k", "v2"))
            );
        });
    }

    #[test]
    fn test_ack_missing_entry_not_found() {
        for_each_backend(|store| {
            let result = store.ack_outbox_entry(b"ghost", b"v");
            assert!(matches!(result, Err(StorageError::NotFound)));
        });
    }

    #[test]
    fn test_ack_twice_second_is_not_found() {
        for_each_backend(|store| {
            store.set_key(b"k", b"v").unwrap();
            store.ack_outbox_entry(b"k", b"v").unwrap();

            let result = store.ack_outbox_entry(b"k", b"v");
            assert!(matches!(result, Err(StorageError::NotFound)));
        });
    }

    #[test]
    fn test_write_after_ack_is_enqueued_again() {
        for_each_backend(|store| {
            store.set_key(b"k", b"v1").unwrap();
            store.ack_outbox_entry(b"k", b"v1").unwrap();
            store.set_key(b"k", b"v1").unwrap();

            assert_eq!(
                store.peek_oldest_outbox_entry().unwrap(),
                Some(OutboxEntry::new("k", "v1"))
            );
        });
    }

    // ============================================================
    // CLEANUP TESTS
    // ============================================================

    #[test]
    fn test_delete_keys_not_owned_removes_selected() {
        for_each_backend(|store| {
            store.set_key(b"keep-1", b"a").unwrap();
            store.set_key(b"drop-1", b"b").unwrap();
            store.set_key(b"keep-2", b"c").unwrap();
            store.set_key(b"drop-2", b"d").unwrap();

            let deleted = store
                .delete_keys_not_owned(&|key: &[u8]| key.starts_with(b"drop"))
                .unwrap();

            assert_eq!(deleted, 2);
            assert_eq!(store.get_key(b"drop-1").unwrap(), None);
            assert_eq!(store.get_key(b"drop-2").unwrap(), None);
            assert_eq!(store.get_key(b"keep-1").unwrap(), Some(b"a".to_vec()));
            assert_eq!(store.get_key(b"keep-2").unwrap(), Some(b"c".to_vec()));
        });
    }

    #[test]
    fn test_delete_keys_not_owned_with_nothing_selected() {
        for_each_backend(|store| {
            store.set_key(b"a", b"1").unwrap();

            let deleted = store.delete_keys_not_owned(&|_: &[u8]| false).unwrap();

            assert_eq!(deleted, 0);
            assert_eq!(store.get_key(b"a").unwrap(), Some(b"1".to_vec()));
        });
    }

    #[test]
    fn test_delete_keys_not_owned_leaves_outbox() {
        for_each_backend(|store| {
            store.set_key(b"foreign", b"v").unwrap();

            store.delete_keys_not_owned(&|_: &[u8]| true).unwrap();

            assert_eq!(store.get_key(b"foreign").unwrap(), None);
            assert_eq!(
                store.outbox_len().unwrap(),
                1,
                "Pending replication must still reach the owner"
            );
        });
    }

    #[test]
    fn test_delete_keys_not_owned_on_read_only() {
        let memory = MemoryStore::new(true);
        memory.apply_replicated(b"foreign", b"v").unwrap();

        let dir = TempDir::new().unwrap();
        {
            let disk = open_disk(&dir, true);
            disk.apply_replicated(b"foreign", b"v").unwrap();
        }
        let disk = open_disk(&dir, true);

        // Replicas are read-only and still drop keys after a reshard
        let stores: [&dyn StorageEngine; 2] = [&memory, &disk];
        for store in stores {
            let deleted = store.delete_keys_not_owned(&|_: &[u8]| true).unwrap();
            assert_eq!(deleted, 1);
            assert_eq!(store.get_key(b"foreign").unwrap(), None);
        }
    }

    // ============================================================
    // PERSISTENCE TESTS
    // ============================================================

    #[test]
    fn test_disk_store_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = open_disk(&dir, false);
            store.set_key(b"alice", b"v1").unwrap();
            store.set_key(b"bob", b"v2").unwrap();
            store.ack_outbox_entry(b"bob", b"v2").unwrap();
        }

        let store = open_disk(&dir, false);
        assert_eq!(store.get_key(b"alice").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get_key(b"bob").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(
            store.peek_oldest_outbox_entry().unwrap(),
            Some(OutboxEntry::new("alice", "v1"))
        );
        assert_eq!(store.outbox_len().unwrap(), 1);
    }

    #[test]
    fn test_disk_store_reopen_read_only() {
        let dir = TempDir::new().unwrap();

        {
            let store = open_disk(&dir, false);
            store.set_key(b"k", b"v").unwrap();
        }

        let store = open_disk(&dir, true);
        assert_eq!(store.get_key(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(matches!(
            store.set_key(b"k", b"v2"),
            Err(StorageError::ReadOnly)
        ));
    }

    #[test]
    fn test_open_unusable_path_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"occupied").unwrap();

        let result = FjallStore::open(&file, false);
        assert!(result.is_err());
    }

    // ============================================================
    // CONCURRENCY TESTS
    // ============================================================

    #[test]
    fn test_readers_never_see_partial_writes() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new(false));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..500u32 {
                    let value = i.to_be_bytes();
                    store.set_key(b"k", &value).unwrap();
                }
            })
        };

        // Once an outbox entry is visible, its write is visible in primary too
        for _ in 0..500 {
            if let Some(entry) = store.peek_oldest_outbox_entry().unwrap() {
                let primary = store.get_key(&entry.key).unwrap().unwrap();
                let seen = u32::from_be_bytes(primary.try_into().unwrap());
                let queued = u32::from_be_bytes(entry.value.try_into().unwrap());
                assert!(seen >= queued);
            }
        }

        writer.join().unwrap();
        assert_eq!(store.outbox_len().unwrap(), 1);
    }
}
