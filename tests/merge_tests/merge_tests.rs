//! Tests for merge / compaction
//!
//! These tests verify:
//! - Empty log merge is a no-op
//! - Live values survive a merge unchanged
//! - Superseded writes and tombstones are dropped
//! - The log never grows
//! - A log with no live entries is left untouched
//! - Merged stores reopen and keep accepting writes
//! - A failed merge leaves log, index and directory as they were
//! - Merge serializes with concurrent writers

#[path = "../common/mod.rs"]
mod common;

use std::fs;

use caskkv::config::SyncStrategy;
use caskkv::log::{LogFile, Mark};
use caskkv::{CaskError, Store};
use tempfile::TempDir;

use common::{init_tracing, overwrite_raw, reopen, setup_temp_store};

// =============================================================================
// No-op Tests
// =============================================================================

#[test]
fn test_merge_empty_log_is_noop() {
    let (temp, store) = setup_temp_store();

    let stats = store.merge().unwrap();

    assert!(!stats.swapped);
    assert_eq!(stats.entries_scanned, 0);
    assert_eq!(stats.bytes_before, 0);
    assert_eq!(stats.bytes_after, 0);
    assert!(!temp.path().join(Store::MERGE_FILENAME).exists());
    assert_eq!(store.log_size(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_merge_without_live_entries_keeps_log() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();
    store.del(b"a").unwrap();
    let size = store.log_size();
    let contents = fs::read(store.log_path()).unwrap();

    let stats = store.merge().unwrap();

    assert!(!stats.swapped);
    assert_eq!(stats.entries_scanned, 3);
    assert_eq!(stats.entries_kept, 0);
    assert_eq!(stats.bytes_reclaimed(), 0);
    assert_eq!(store.log_size(), size);
    assert_eq!(fs::read(store.log_path()).unwrap(), contents);
    assert!(!temp.path().join(Store::MERGE_FILENAME).exists());
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_merge_scenario_single_live_entry() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let store = reopen(temp_dir.path());

    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();
    assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
    store.del(b"a").unwrap();
    assert_eq!(store.get(b"a").unwrap(), None);
    store.set(b"b", b"x").unwrap();

    let stats = store.merge().unwrap();

    assert!(stats.swapped);
    assert_eq!(stats.entries_scanned, 4);
    assert_eq!(stats.entries_kept, 1);
    assert_eq!(store.get(b"b").unwrap(), Some(b"x".to_vec()));
    assert_eq!(store.get(b"a").unwrap(), None);
    assert_eq!(store.offset_of(b"b"), Some(0));
    assert_eq!(store.log_size(), 12);

    let log_path = store.log_path().to_path_buf();
    store.close().unwrap();

    let log = LogFile::open(&log_path, SyncStrategy::Never).unwrap();
    let entries: Vec<_> = log.iter().map(|item| item.unwrap()).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, 0);
    assert_eq!(entries[0].1.key, b"b".to_vec());
    assert_eq!(entries[0].1.value, b"x".to_vec());
    assert_eq!(entries[0].1.mark, Mark::Set);
}

#[test]
fn test_merge_preserves_values_and_shrinks_log() {
    let (temp, store) = setup_temp_store();

    for round in 0..10 {
        for k in 0..20 {
            let key = format!("key{}", k);
            let value = format!("value{}_{}", k, round);
            store.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
    }
    for k in (0..20).step_by(3) {
        store.del(format!("key{}", k).as_bytes()).unwrap();
    }

    let mut before: Vec<(Vec<u8>, Option<Vec<u8>>)> = store
        .keys()
        .into_iter()
        .map(|k| {
            let v = store.get(&k).unwrap();
            (k, v)
        })
        .collect();
    before.sort();
    let size_before = store.log_size();

    let stats = store.merge().unwrap();

    let mut after: Vec<(Vec<u8>, Option<Vec<u8>>)> = store
        .keys()
        .into_iter()
        .map(|k| {
            let v = store.get(&k).unwrap();
            (k, v)
        })
        .collect();
    after.sort();

    assert_eq!(after, before);
    assert!(store.log_size() <= size_before);
    assert_eq!(stats.bytes_before, size_before);
    assert_eq!(stats.bytes_after, store.log_size());
    assert_eq!(stats.entries_kept as usize, store.len());
    assert!(stats.bytes_reclaimed() > 0);
    assert!(!temp.path().join(Store::MERGE_FILENAME).exists());
}

#[test]
fn test_merge_keeps_live_entry_order() {
    let (_temp, store) = setup_temp_store();

    store.set(b"first", b"1").unwrap();
    store.set(b"second", b"2").unwrap();
    store.set(b"first", b"3").unwrap();
    store.set(b"third", b"4").unwrap();

    store.merge().unwrap();

    // Live entries in original log order: second, first, third
    assert_eq!(store.offset_of(b"second"), Some(0));
    assert_eq!(store.offset_of(b"first"), Some(17));
    assert_eq!(store.offset_of(b"third"), Some(33));
    assert_eq!(store.log_size(), 49);
}

#[test]
fn test_merge_twice_is_stable() {
    let (_temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();
    store.set(b"b", b"3").unwrap();

    store.merge().unwrap();
    let size = store.log_size();
    let stats = store.merge().unwrap();

    // Already compact: rewritten byte for byte
    assert_eq!(stats.bytes_before, size);
    assert_eq!(stats.bytes_after, size);
    assert_eq!(stats.entries_scanned, 2);
    assert_eq!(stats.entries_kept, 2);
    assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
}

// =============================================================================
// After-Merge Tests
// =============================================================================

#[test]
fn test_writes_after_merge() {
    let (_temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();

    store.merge().unwrap();
    assert_eq!(store.log_size(), 12);

    store.set(b"b", b"3").unwrap();
    assert_eq!(store.offset_of(b"b"), Some(12));
    store.del(b"a").unwrap();

    assert_eq!(store.get(b"a").unwrap(), None);
    assert_eq!(store.get(b"b").unwrap(), Some(b"3".to_vec()));
    assert_eq!(store.log_size(), 12 + 12 + 11);
}

#[test]
fn test_reopen_after_merge() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();

    let (expected_size, mut expected_keys) = {
        let store = reopen(temp_dir.path());
        for i in 0..100 {
            let key = format!("k{}", i % 10);
            store.set(key.as_bytes(), format!("v{}", i).as_bytes()).unwrap();
        }
        store.del(b"k3").unwrap();
        store.merge().unwrap();
        store.set(b"k3", b"back").unwrap();

        let size = store.log_size();
        let keys = store.keys();
        store.close().unwrap();
        (size, keys)
    };
    expected_keys.sort();

    let store = reopen(temp_dir.path());
    let mut keys = store.keys();
    keys.sort();

    assert_eq!(keys, expected_keys);
    assert_eq!(store.log_size(), expected_size);
    assert_eq!(store.get(b"k3").unwrap(), Some(b"back".to_vec()));
    assert_eq!(store.get(b"k9").unwrap(), Some(b"v99".to_vec()));
    assert!(!temp_dir.path().join(Store::MERGE_FILENAME).exists());
}

#[test]
fn test_merge_leaves_single_log_file() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();

    store.merge().unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![Store::LOG_FILENAME.to_string()]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_failed_rewrite_leaves_store_intact() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"a", b"2").unwrap();
    store.set(b"b", b"3").unwrap();
    let size = store.log_size();
    let contents = fs::read(store.log_path()).unwrap();

    // The merge file cannot be created over a directory
    let merge_path = temp.path().join(Store::MERGE_FILENAME);
    fs::create_dir(&merge_path).unwrap();

    assert!(matches!(store.merge(), Err(CaskError::Io(_))));

    assert_eq!(store.log_size(), size);
    assert_eq!(fs::read(store.log_path()).unwrap(), contents);
    assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
    assert_eq!(store.get(b"b").unwrap(), Some(b"3".to_vec()));
    assert_eq!(store.offset_of(b"a"), Some(12));

    // Writes keep going to the original log
    store.set(b"c", b"4").unwrap();
    assert_eq!(store.offset_of(b"c"), Some(size));
    assert_eq!(store.get(b"c").unwrap(), Some(b"4".to_vec()));

    fs::remove_dir(&merge_path).unwrap();
    let stats = store.merge().unwrap();
    assert!(stats.swapped);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_failed_scan_leaves_store_intact() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", b"1").unwrap();
    store.set(b"b", b"2").unwrap();
    store.set(b"c", b"3").unwrap();

    // Unknown mark on the middle entry (header at 12, mark at 12 + 8)
    overwrite_raw(store.log_path(), 20, &7u16.to_be_bytes());
    let contents = fs::read(store.log_path()).unwrap();

    match store.merge() {
        Err(CaskError::Corruption { offset, .. }) => assert_eq!(offset, 12),
        other => panic!("expected corruption, got {:?}", other),
    }

    assert!(!temp.path().join(Store::MERGE_FILENAME).exists());
    assert_eq!(store.log_size(), 36);
    assert_eq!(fs::read(store.log_path()).unwrap(), contents);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
    assert_eq!(store.offset_of(b"c"), Some(24));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_merge_concurrent_with_writers() {
    let (temp, store) = setup_temp_store();

    crossbeam::scope(|s| {
        let store = &store;
        for t in 0..3 {
            s.spawn(move |_| {
                for round in 0..50 {
                    for k in 0..5 {
                        let key = format!("t{}_k{}", t, k);
                        let value = format!("t{}_k{}_r{}", t, k, round);
                        store.set(key.as_bytes(), value.as_bytes()).unwrap();
                    }
                    if round % 10 == 0 {
                        store.del(format!("t{}_k0", t).as_bytes()).unwrap();
                    }
                }
            });
        }
        s.spawn(move |_| {
            for _ in 0..10 {
                store.merge().unwrap();
            }
        });
    })
    .unwrap();

    for t in 0..3 {
        for k in 0..5 {
            let key = format!("t{}_k{}", t, k);
            let expected = format!("t{}_k{}_r49", t, k);
            assert_eq!(store.get(key.as_bytes()).unwrap(), Some(expected.into_bytes()));
        }
    }

    let size = store.log_size();
    store.close().unwrap();

    // Log and index stayed consistent through every swap
    let reopened = reopen(temp.path());
    assert_eq!(reopened.len(), 15);
    assert_eq!(reopened.log_size(), size);
}
