//! Tests for Engine
//!
//! These tests verify:
//! - Value and numeric operations through the facade
//! - The durability gate at engine level
//! - Restart recovery and compaction idempotence
//! - The background sync worker
//! - Concurrent access

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use seglog::{Config, Engine, SyncWorker};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    (temp_dir, engine)
}

fn open_engine(temp_dir: &TempDir) -> Engine {
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .segment_max_size(256) // small, to exercise rotation
        .sync_interval_ms(10)
        .build();
    Engine::open(config).unwrap()
}

/// Wait until the key becomes visible, or panic after two seconds
fn wait_for_key(engine: &Engine, key: &[u8]) -> Vec<u8> {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(value) = engine.get(key).unwrap() {
            return value;
        }
        assert!(Instant::now() < deadline, "key never confirmed durable");
        thread::sleep(Duration::from_millis(5));
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_files() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let config = Config::builder().data_dir(&data_dir).build();
    let _engine = Engine::open(config).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("keys.idx").exists());
    assert!(data_dir.join("numbers.idx").exists());
    assert!(data_dir.join("segments.meta").exists());
    assert!(data_dir.join("segment_0").exists());
}

#[test]
fn test_engine_put_get() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"hello", b"world").unwrap();
    engine.sync().unwrap();

    assert_eq!(engine.get(b"hello").unwrap(), Some(b"world".to_vec()));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.get(b"nonexistent").unwrap(), None);
}

#[test]
fn test_engine_durability_gate() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"key", b"value").unwrap();

    // Staleness before sync is permitted and expected here
    assert_eq!(engine.get(b"key").unwrap(), None);

    engine.sync().unwrap();
    assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
}

#[test]
fn test_engine_put_overwrite() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"key", b"value1").unwrap();
    engine.put(b"key", b"value2").unwrap();
    engine.sync().unwrap();

    assert_eq!(engine.get(b"key").unwrap(), Some(b"value2".to_vec()));
}

// =============================================================================
// Numeric Index Tests
// =============================================================================

#[test]
fn test_engine_put_number_get_number() {
    let (_temp, engine) = setup_temp_engine();

    engine.put_number(b"offset", 42).unwrap();
    assert_eq!(engine.get_number(b"offset"), None);

    engine.sync().unwrap();
    assert_eq!(engine.get_number(b"offset"), Some(42));
}

#[test]
fn test_number_and_value_namespaces_are_independent() {
    let (_temp, engine) = setup_temp_engine();

    engine.put(b"shared", b"bytes").unwrap();
    engine.put_number(b"shared", 7).unwrap();
    engine.sync().unwrap();

    assert_eq!(engine.get(b"shared").unwrap(), Some(b"bytes".to_vec()));
    assert_eq!(engine.get_number(b"shared"), Some(7));
}

// =============================================================================
// Restart Tests
// =============================================================================

#[test]
fn test_restart_preserves_data() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp_dir);
        engine.put(b"k1", b"v1").unwrap();
        engine.put(b"k2", b"v2").unwrap();
        engine.put_number(b"n1", 100).unwrap();
        engine.sync().unwrap();
        engine.close().unwrap();
    }

    let engine = open_engine(&temp_dir);
    assert_eq!(engine.get(b"k1").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(engine.get(b"k2").unwrap(), Some(b"v2".to_vec()));
    assert_eq!(engine.get_number(b"n1"), Some(100));
}

#[test]
fn test_restart_without_close_preserves_flushed_writes() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp_dir);
        engine.put(b"k", b"v").unwrap();
        // No sync, no close: the bytes were still flushed to the log, and
        // bytes that survived a restart are durable by definition
    }

    let engine = open_engine(&temp_dir);
    assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_compaction_reproduces_identical_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let mut expected = HashMap::new();

    {
        let engine = open_engine(&temp_dir);
        for round in 0..10u8 {
            for k in 0..8u8 {
                let key = format!("key{k}");
                let value = vec![round; 40];
                engine.put(key.as_bytes(), &value).unwrap();
                expected.insert(key, value);
            }
        }
        engine.sync().unwrap();
        engine.close().unwrap();
    }

    let engine = open_engine(&temp_dir);
    for (key, value) in &expected {
        assert_eq!(
            engine.get(key.as_bytes()).unwrap().as_ref(),
            Some(value),
            "{key} changed across restart"
        );
    }
}

// =============================================================================
// Sync Worker Tests
// =============================================================================

#[test]
fn test_sync_worker_confirms_writes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&temp_dir));

    let worker = SyncWorker::spawn(Arc::clone(&engine));

    engine.put(b"background", b"confirmed").unwrap();
    assert_eq!(wait_for_key(&engine, b"background"), b"confirmed".to_vec());

    worker.stop().unwrap();
}

#[test]
fn test_sync_worker_stops_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&temp_dir));

    let worker = SyncWorker::spawn(Arc::clone(&engine));
    worker.stop().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_puts_are_all_confirmed() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&temp_dir));

    let mut handles = Vec::new();
    for t in 0..4u8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..25u8 {
                let key = format!("t{t}-key{i}");
                engine.put(key.as_bytes(), &[t, i]).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    engine.sync().unwrap();

    for t in 0..4u8 {
        for i in 0..25u8 {
            let key = format!("t{t}-key{i}");
            assert_eq!(
                engine.get(key.as_bytes()).unwrap(),
                Some(vec![t, i]),
                "{key} lost under concurrency"
            );
        }
    }
}

#[test]
fn test_concurrent_reads_and_writes() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&temp_dir));

    engine.put(b"stable", b"value").unwrap();
    engine.sync().unwrap();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..50u8 {
                engine.put(b"moving", &[i]).unwrap();
            }
        })
    };

    // Reads of a confirmed key must never fail while writes proceed
    for _ in 0..50 {
        assert_eq!(engine.get(b"stable").unwrap(), Some(b"value".to_vec()));
    }

    writer.join().unwrap();
}
