//! Tests for crash recovery
//!
//! These tests verify:
//! - Index reconstruction by log replay on open
//! - Torn-tail truncation (crash mid-write)
//! - Equivalence between the live index and a replayed one

use std::fs::OpenOptions;

use serde_json::json;
use tempfile::TempDir;

use bitstore::Engine;

// =============================================================================
// Helper Functions
// =============================================================================

fn truncate_file(path: &std::path::Path, drop_bytes: u64) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - drop_bytes).unwrap();
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn open_missing_file_creates_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fresh/data.log");

    let mut engine = Engine::open_path(&path).unwrap();
    assert!(path.exists());
    assert_eq!(engine.stats().keys_in_index, 0);
    assert_eq!(engine.get("anything").unwrap(), None);
}

#[test]
fn open_zero_byte_file_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");
    std::fs::write(&path, b"").unwrap();

    let engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.stats().keys_in_index, 0);
}

#[test]
fn reopen_replays_all_durable_operations() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.put("name", json!("suraj"), None).unwrap();
        engine.put("age", json!(21), None).unwrap();
        engine.put("name", json!("suraj2"), None).unwrap();
        engine.delete("age").unwrap();
        engine.close().unwrap();
    }

    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.get("name").unwrap(), Some(json!("suraj2")));
    assert_eq!(engine.get("age").unwrap(), None);
    assert_eq!(engine.stats().keys_in_index, 1);
}

#[test]
fn tombstone_for_unknown_key_replays_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.delete("never-existed").unwrap();
        engine.put("k", json!("v"), None).unwrap();
    }

    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.get("k").unwrap(), Some(json!("v")));
    assert_eq!(engine.stats().keys_in_index, 1);
}

#[test]
fn expired_keys_are_indexed_on_replay_until_read() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.put("s", json!("x"), Some(1)).unwrap();
    }

    std::thread::sleep(std::time::Duration::from_secs(2));

    // Replay indexes the key (a later record could supersede it); the
    // first GET expires it.
    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.stats().keys_in_index, 1);
    assert_eq!(engine.get("s").unwrap(), None);
    assert_eq!(engine.stats().keys_in_index, 0);
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

#[test]
fn crash_truncation_recovers_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    let n: usize = 1000;
    {
        let mut engine = Engine::open_path(&path).unwrap();
        for i in 0..n {
            engine.put(&format!("key{}", i), json!(i), None).unwrap();
        }
    }

    // Simulate a crash mid-write of the final record.
    truncate_file(&path, 5);

    let mut engine = Engine::open_path(&path).unwrap();
    // Every key except the torn last one survives.
    assert_eq!(engine.stats().keys_in_index, n - 1);
    assert_eq!(engine.get("key0").unwrap(), Some(json!(0)));
    assert_eq!(engine.get(&format!("key{}", n - 2)).unwrap(), Some(json!(n - 2)));
    assert_eq!(engine.get(&format!("key{}", n - 1)).unwrap(), None);
}

#[test]
fn torn_tail_is_truncated_so_appends_stay_parseable() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    let clean_len;
    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.put("a", json!("1"), None).unwrap();
        clean_len = engine.stats().file_size_bytes;
        engine.put("b", json!("2"), None).unwrap();
    }

    // Tear the second record mid-payload.
    truncate_file(&path, 3);

    {
        let mut engine = Engine::open_path(&path).unwrap();
        assert_eq!(engine.stats().keys_in_index, 1);
        // The torn bytes are gone from disk, not just skipped.
        assert_eq!(engine.stats().file_size_bytes, clean_len);
        engine.put("c", json!("3"), None).unwrap();
    }

    // A third open sees both surviving records with no garbage between.
    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.stats().keys_in_index, 2);
    assert_eq!(engine.get("a").unwrap(), Some(json!("1")));
    assert_eq!(engine.get("c").unwrap(), Some(json!("3")));
}

#[test]
fn garbage_tail_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    let clean_len;
    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.put("good", json!("record"), None).unwrap();
        clean_len = engine.stats().file_size_bytes;
    }

    // Append bytes that are not a valid frame at all.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.extend_from_slice(b"complete garbage, not a header\n");
    std::fs::write(&path, &bytes).unwrap();

    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.get("good").unwrap(), Some(json!("record")));
    assert_eq!(engine.stats().file_size_bytes, clean_len);
}
