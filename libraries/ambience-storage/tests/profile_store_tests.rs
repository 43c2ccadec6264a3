//! Profile store persistence and concurrency tests

use ambience_storage::{PlaybackProfile, ProfileStore, StorageError, STORE_FILE_NAME};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn profile(id: &str, hash: Option<&str>, lufs: f64, peak: f64, gain: f64) -> PlaybackProfile {
    PlaybackProfile {
        asset_id: id.to_string(),
        file_hash: hash.map(str::to_string),
        integrated_lufs: lufs,
        true_peak_dbtp: peak,
        gain_db: gain,
        needs_limiter: peak + gain > -1.0,
        analysis_date: Utc::now(),
        analysis_version: "1.0".to_string(),
    }
}

#[test]
fn test_missing_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();

    assert!(store.is_empty());
    assert_eq!(store.path(), Some(dir.path().join(STORE_FILE_NAME).as_path()));
    // Nothing is written until the first mutation
    assert!(!dir.path().join(STORE_FILE_NAME).exists());
}

#[test]
fn test_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let stored = profile("rain.flac", Some("abc123"), -33.417, -7.25, 6.417);

    {
        let store = ProfileStore::open(dir.path()).unwrap();
        store.put(stored.clone()).unwrap();
        store.close().unwrap();
    }

    let reopened = ProfileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get("rain.flac"), Some(stored));
}

#[test]
fn test_file_is_json_array() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    store
        .put_many(vec![
            profile("b.wav", None, -30.0, -10.0, 3.0),
            profile("a.wav", Some("ff"), -35.0, -12.0, 8.0),
        ])
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join(STORE_FILE_NAME)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let array = json.as_array().unwrap();

    assert_eq!(array.len(), 2);
    assert_eq!(array[0]["id"], "a.wav");
    assert_eq!(array[0]["fileHash"], "ff");
    assert!(array[1].get("fileHash").is_none());
    assert!(!dir.path().join("playbackProfiles.json.tmp").exists());
}

#[test]
fn test_remove_persists() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    store.put(profile("a.wav", None, -30.0, -10.0, 3.0)).unwrap();
    store.put(profile("b.wav", None, -30.0, -10.0, 3.0)).unwrap();
    store.remove("a.wav").unwrap();

    let reopened = ProfileStore::open(dir.path()).unwrap();
    assert!(reopened.get("a.wav").is_none());
    assert!(reopened.get("b.wav").is_some());
}

#[test]
fn test_corrupt_file_fails_loudly() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(STORE_FILE_NAME), "{ not json").unwrap();

    let result = ProfileStore::open(dir.path());
    assert!(matches!(result, Err(StorageError::CorruptStore { .. })));
}

#[test]
fn test_corrupt_file_recovery() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(STORE_FILE_NAME), "[{\"id\": 7}]").unwrap();

    let store = ProfileStore::open_or_recover(dir.path()).unwrap();
    assert!(store.is_empty());
    assert!(dir.path().join("playbackProfiles.json.corrupt").exists());

    store.put(profile("a.wav", None, -30.0, -10.0, 3.0)).unwrap();
    assert_eq!(ProfileStore::open(dir.path()).unwrap().len(), 1);
}

#[test]
fn test_write_failure_keeps_memory_state() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("profiles");
    let store = ProfileStore::open(&dir).unwrap();

    // A regular file where the store directory should be
    std::fs::write(&dir, b"blocker").unwrap();

    let result = store.put(profile("a.wav", None, -30.0, -10.0, 3.0));
    let err = result.unwrap_err();
    assert!(matches!(err, StorageError::Persist { .. }));
    assert!(err.is_recoverable());

    assert!(store.get("a.wav").is_some());
}

#[test]
fn test_non_finite_profile_rejected_and_file_stays_readable() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::open(dir.path()).unwrap();
    store.put(profile("good.wav", Some("aa"), -30.0, -10.0, 3.0)).unwrap();

    let mut bad = profile("bad.wav", None, -30.0, -10.0, 3.0);
    bad.true_peak_dbtp = f64::NEG_INFINITY;
    let err = store.put(bad).unwrap_err();
    assert!(matches!(err, StorageError::InvalidProfile { .. }));
    assert!(!err.is_recoverable());
    assert!(store.get("bad.wav").is_none());

    // A batch with one bad entry stores none of it
    let mut nan_gain = profile("nan.wav", None, -30.0, -10.0, 3.0);
    nan_gain.gain_db = f64::NAN;
    let batch = vec![profile("other.wav", None, -32.0, -9.0, 5.0), nan_gain];
    assert!(store.put_many(batch).is_err());
    assert!(!store.contains("other.wav"));

    let raw = std::fs::read_to_string(dir.path().join(STORE_FILE_NAME)).unwrap();
    assert!(!raw.contains("null"));

    let reopened = ProfileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert!(reopened.get("good.wav").is_some());
}

#[test]
fn test_needs_update_after_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = ProfileStore::open(dir.path()).unwrap();
        assert!(store.needs_update("a.wav", "h1"));
        store.put(profile("a.wav", Some("h1"), -30.0, -10.0, 3.0)).unwrap();
    }

    let store = ProfileStore::open(dir.path()).unwrap();
    assert!(!store.needs_update("a.wav", "h1"));
    assert!(!store.needs_update("a.wav", "h1"));
    assert!(store.needs_update("a.wav", "h2"));
}

#[test]
fn test_concurrent_puts_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ProfileStore::open(dir.path()).unwrap());

    let handles: Vec<_> = ["left.wav", "right.wav"]
        .into_iter()
        .map(|id| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .put(profile(id, Some(i.to_string().as_str()), -30.0, -10.0, 3.0))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(store.get("left.wav").is_some());
    assert!(store.get("right.wav").is_some());

    let reopened = ProfileStore::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.get("left.wav").unwrap().file_hash.as_deref(), Some("24"));
}

#[test]
fn test_read_after_write_same_thread() {
    let store = ProfileStore::in_memory();
    for i in 0..10 {
        store.put(profile("a.wav", None, -30.0, -10.0, f64::from(i))).unwrap();
        assert_eq!(store.get("a.wav").unwrap().gain_db, f64::from(i));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Any finite profile survives a trip through the JSON file unchanged
    #[test]
    fn profile_round_trip(
        lufs in -100.0_f64..0.0,
        peak in -100.0_f64..6.0,
        gain in 0.0_f64..18.0,
        seconds in 0_i64..2_000_000_000,
        nanos in 0_u32..1_000_000_000,
        hash in proptest::option::of("[0-9a-f]{64}"),
    ) {
        let dir = TempDir::new().unwrap();
        let mut stored = profile("asset.m4a", hash.as_deref(), lufs, peak, gain);
        stored.analysis_date = Utc.timestamp_opt(seconds, nanos).unwrap();

        let store = ProfileStore::open(dir.path()).unwrap();
        store.put(stored.clone()).unwrap();

        let reopened = ProfileStore::open(dir.path()).unwrap();
        prop_assert_eq!(reopened.get("asset.m4a"), Some(stored));
    }
}
