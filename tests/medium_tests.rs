//! Tests for storage media
//!
//! These tests verify:
//! - The store behaves the same over both media
//! - File-backed data survives reopening
//! - Uncommitted EEPROM writes are lost on power cycle
//! - Capacity limits per medium

use std::path::{Path, PathBuf};

use cellkv::medium::{FileMedium, MemoryMedium, StorageMedium};
use cellkv::store::Store;
use cellkv::CellError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_file() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.txt");
    (temp_dir, path)
}

fn open_file_store(path: &Path, capacity: usize) -> Store<FileMedium> {
    let mut store = Store::new(FileMedium::open(path, capacity).unwrap());
    store.begin().unwrap();
    store
}

/// Same workload against any medium
fn exercise<M: StorageMedium>(store: &mut Store<M>) {
    store.format().unwrap();
    store.insert("a", "1").unwrap();
    store.insert("b", "22").unwrap();
    store.remove("a").unwrap();
    store.insert("c", "333").unwrap();
    store.insert("b", "4444").unwrap();
}

// =============================================================================
// File Medium Tests
// =============================================================================

#[test]
fn test_new_file_reads_as_empty_log() {
    let (_temp, path) = setup_temp_file();

    let store = open_file_store(&path, 256);

    assert_eq!(store.used_bytes().unwrap(), 0);
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_file_contents_are_the_wire_format() {
    let (_temp, path) = setup_temp_file();

    {
        let mut store = open_file_store(&path, 64);
        store.insert("a", "1").unwrap();
        store.insert("b", "22").unwrap();
        store.remove("a").unwrap();
    }

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(raw.len(), 64);
    assert_eq!(&raw[..13], b"a>0:1\nb>1:22\n");
    assert!(raw[13..].iter().all(|&b| b == b'\n'));
}

#[test]
fn test_file_data_survives_reopen() {
    let (_temp, path) = setup_temp_file();

    {
        let mut store = open_file_store(&path, 256);
        store.insert("persist", "me").unwrap();
        store.insert("drop", "me").unwrap();
        store.remove("drop").unwrap();
    }

    let store = open_file_store(&path, 256);
    assert_eq!(store.get("persist", "").unwrap(), "me");
    assert!(!store.exists("drop").unwrap());
}

#[test]
fn test_file_reopen_with_larger_capacity_keeps_data() {
    let (_temp, path) = setup_temp_file();

    {
        let mut store = open_file_store(&path, 64);
        store.insert("k", "v").unwrap();
    }

    let store = open_file_store(&path, 128);
    assert_eq!(store.capacity(), 128);
    assert_eq!(store.get("k", "").unwrap(), "v");
}

#[test]
fn test_file_optimize_persists() {
    let (_temp, path) = setup_temp_file();

    {
        let mut store = open_file_store(&path, 128);
        exercise(&mut store);
        store.optimize().unwrap();
    }

    let store = open_file_store(&path, 128);
    assert_eq!(
        String::from_utf8(store.get_all().unwrap().to_vec()).unwrap(),
        "c>1:333\nb>1:4444\n"
    );
}

#[test]
fn test_file_capacity_limit() {
    let (_temp, path) = setup_temp_file();

    let mut store = Store::new(FileMedium::open(&path, FileMedium::MAX_CAPACITY + 1).unwrap());

    assert!(matches!(store.begin(), Err(CellError::InvalidCapacity { .. })));
}

// =============================================================================
// Memory Medium Tests
// =============================================================================

#[test]
fn test_fresh_eeprom_needs_format() {
    let mut store = Store::new(MemoryMedium::new(64));
    store.begin().unwrap();

    // Erased cells carry no end marker: the whole medium counts as used
    assert_eq!(store.used_bytes().unwrap(), 64);

    store.format().unwrap();
    assert_eq!(store.used_bytes().unwrap(), 0);
}

#[test]
fn test_eeprom_power_cycle_keeps_committed_records() {
    let mut store = Store::new(MemoryMedium::new(64));
    store.begin().unwrap();
    store.format().unwrap();
    store.insert("k", "v").unwrap();

    let mut medium = store.into_medium();
    medium.power_cycle();

    let mut store = Store::new(medium);
    store.begin().unwrap();
    assert_eq!(store.get("k", "").unwrap(), "v");
}

#[test]
fn test_eeprom_capacity_limit() {
    let mut store = Store::new(MemoryMedium::new(MemoryMedium::MAX_CAPACITY));
    assert!(store.begin().is_ok());

    let mut store = Store::new(MemoryMedium::new(0));
    assert!(matches!(store.begin(), Err(CellError::InvalidCapacity { .. })));
}

// =============================================================================
// Cross-Medium Tests
// =============================================================================

#[test]
fn test_both_media_produce_identical_logs() {
    let (_temp, path) = setup_temp_file();

    let mut file_store = open_file_store(&path, 128);
    let mut memory_store = Store::new(MemoryMedium::new(128));
    memory_store.begin().unwrap();

    exercise(&mut file_store);
    exercise(&mut memory_store);

    assert_eq!(file_store.get_all().unwrap(), memory_store.get_all().unwrap());
    assert_eq!(
        file_store.medium().read_range(0, 128).unwrap(),
        memory_store.medium().committed()
    );
}
