//! Integration tests for BitStore
//!
//! Component-level coverage lives in dedicated files:
//! - Record codec: tests/record_tests.rs
//! - Recency cache: tests/cache_tests.rs
//! - Engine operations: tests/engine_tests.rs
//! - Recovery: tests/recovery_tests.rs
//! - Compaction: tests/compaction_tests.rs
//! - TCP server: tests/server_tests.rs
//!
//! This file contains configuration tests and higher-level scenarios that
//! span multiple components.

use serde_json::json;
use tempfile::TempDir;

use bitstore::{Config, Engine, StoreError};

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.path.to_str().unwrap(), "./bitstore_data/data.log");
    assert_eq!(config.cache_capacity, 1000);
    assert_eq!(config.listen_addr, "127.0.0.1:5000");
    assert_eq!(config.max_connections, 1024);
    assert_eq!(config.read_timeout_ms, 5000);
    assert_eq!(config.write_timeout_ms, 5000);
}

#[test]
fn test_config_builder() {
    let config = Config::builder()
        .path("/custom/path/data.log")
        .cache_capacity(16)
        .listen_addr("0.0.0.0:8080")
        .max_connections(100)
        .read_timeout_ms(1000)
        .write_timeout_ms(2000)
        .build();

    assert_eq!(config.path.to_str().unwrap(), "/custom/path/data.log");
    assert_eq!(config.cache_capacity, 16);
    assert_eq!(config.listen_addr, "0.0.0.0:8080");
    assert_eq!(config.max_connections, 100);
    assert_eq!(config.read_timeout_ms, 1000);
    assert_eq!(config.write_timeout_ms, 2000);
}

#[test]
fn zero_cache_capacity_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("data.log"))
        .cache_capacity(0)
        .build();

    assert!(matches!(Engine::open(config), Err(StoreError::Config(_))));
}

// =============================================================================
// End-to-End Scenarios
// =============================================================================

#[test]
fn test_full_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    // Phase 1: write, overwrite, delete, compact, close.
    {
        let mut engine = Engine::open_path(&path).unwrap();

        engine.put("user:1", json!("Alice"), None).unwrap();
        engine.put("user:2", json!("Bob"), None).unwrap();
        engine.put("user:3", json!("Charlie"), None).unwrap();
        engine.put("user:1", json!("Alicia"), None).unwrap();
        engine.delete("user:2").unwrap();

        engine.compact().unwrap();

        // Write more after compaction.
        engine.put("user:4", json!("Diana"), None).unwrap();
        engine.close().unwrap();
    }

    // Phase 2: reopen and verify all durable state.
    {
        let mut engine = Engine::open_path(&path).unwrap();

        assert_eq!(engine.get("user:1").unwrap(), Some(json!("Alicia")));
        assert_eq!(engine.get("user:2").unwrap(), None);
        assert_eq!(engine.get("user:3").unwrap(), Some(json!("Charlie")));
        assert_eq!(engine.get("user:4").unwrap(), Some(json!("Diana")));
        assert_eq!(engine.stats().keys_in_index, 3);
    }
}

#[test]
fn counters_reset_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    {
        let mut engine = Engine::open_path(&path).unwrap();
        engine.put("a", json!(1), None).unwrap();
        engine.delete("a").unwrap();
        assert_eq!(engine.stats().put_count, 1);
        assert_eq!(engine.stats().delete_count, 1);
    }

    // Counters describe the current process's activity since open.
    let engine = Engine::open_path(&path).unwrap();
    let stats = engine.stats();
    assert_eq!(stats.put_count, 0);
    assert_eq!(stats.delete_count, 0);
    assert_eq!(stats.last_compaction_time, None);
}

#[test]
fn reopened_index_matches_logical_replay() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.log");

    {
        let mut engine = Engine::open_path(&path).unwrap();
        for round in 0..3 {
            for i in 0..20 {
                engine
                    .put(&format!("key{}", i), json!(round * 100 + i), None)
                    .unwrap();
            }
        }
        for i in (0..20).step_by(2) {
            engine.delete(&format!("key{}", i)).unwrap();
        }
    }

    let mut engine = Engine::open_path(&path).unwrap();
    assert_eq!(engine.stats().keys_in_index, 10);
    for i in 0..20 {
        let expected = if i % 2 == 0 {
            None
        } else {
            Some(json!(200 + i))
        };
        assert_eq!(engine.get(&format!("key{}", i)).unwrap(), expected);
    }
}
