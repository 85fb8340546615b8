//! Tests for the log reader
//!
//! These tests verify:
//! - Reading records front to back
//! - Clean end-of-log detection
//! - Partial write handling (truncated prefix or body)
//! - Corrupt record classification

use std::fs;
use std::path::PathBuf;

use kvlog::log::{self, Entry, LogReader, ReadOutcome};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("test.kvs");
    (temp_dir, log_path)
}

fn write_log(path: &PathBuf, records: &[Vec<u8>]) {
    fs::write(path, records.concat()).unwrap();
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, log_path) = setup_temp_log();
    fs::write(&log_path, b"").unwrap();

    let mut reader = LogReader::open(&log_path).unwrap();

    assert_eq!(reader.next_record().unwrap(), ReadOutcome::End);
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_read_records_in_order() {
    let (_temp, log_path) = setup_temp_log();
    write_log(
        &log_path,
        &[
            log::encode(1, &[1]).to_vec(),
            log::encode_tombstone(1).to_vec(),
            log::encode(2, &[2, 2]).to_vec(),
        ],
    );

    let mut reader = LogReader::open(&log_path).unwrap();

    assert_eq!(
        reader.next_record().unwrap(),
        ReadOutcome::Record { offset: 0, entry: Entry::Normal { key: 1, value: vec![1] } }
    );
    assert_eq!(
        reader.next_record().unwrap(),
        ReadOutcome::Record { offset: 10, entry: Entry::Deleted { key: 1 } }
    );
    assert_eq!(
        reader.next_record().unwrap(),
        ReadOutcome::Record { offset: 19, entry: Entry::Normal { key: 2, value: vec![2, 2] } }
    );
    assert_eq!(reader.next_record().unwrap(), ReadOutcome::End);
    assert_eq!(reader.position(), 30);
}

// =============================================================================
// Partial Write Tests
// =============================================================================

#[test]
fn test_partial_length_prefix() {
    let (_temp, log_path) = setup_temp_log();
    write_log(&log_path, &[log::encode(1, &[1]).to_vec(), vec![0, 0]]);

    let mut reader = LogReader::open(&log_path).unwrap();
    reader.next_record().unwrap();

    assert_eq!(
        reader.next_record().unwrap(),
        ReadOutcome::Truncated { offset: 10, declared: None, available: 2 }
    );
    assert_eq!(reader.position(), 10);
}

#[test]
fn test_partial_record_body() {
    let (_temp, log_path) = setup_temp_log();
    let mut partial = log::encode(2, &[1, 2, 3, 4, 5]).to_vec();
    partial.truncate(11);
    write_log(&log_path, &[log::encode(1, &[1]).to_vec(), partial]);

    let mut reader = LogReader::open(&log_path).unwrap();
    reader.next_record().unwrap();

    assert_eq!(
        reader.next_record().unwrap(),
        ReadOutcome::Truncated { offset: 10, declared: Some(14), available: 11 }
    );
}

#[test]
fn test_huge_declared_length_is_truncation() {
    let (_temp, log_path) = setup_temp_log();
    write_log(&log_path, &[vec![0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0, 1]]);

    let mut reader = LogReader::open(&log_path).unwrap();

    assert!(matches!(
        reader.next_record().unwrap(),
        ReadOutcome::Truncated { offset: 0, declared: Some(0xFFFF_FFFF), available: 9 }
    ));
}

#[test]
fn test_stops_after_defect() {
    let (_temp, log_path) = setup_temp_log();
    write_log(&log_path, &[vec![0, 0, 0]]);

    let mut reader = LogReader::open(&log_path).unwrap();

    assert!(matches!(reader.next_record().unwrap(), ReadOutcome::Truncated { .. }));
    assert_eq!(reader.next_record().unwrap(), ReadOutcome::End);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_length_below_minimum_is_corrupt() {
    let (_temp, log_path) = setup_temp_log();
    write_log(&log_path, &[vec![0, 0, 0, 5, 0, 0, 0, 0, 0, 0]]);

    let mut reader = LogReader::open(&log_path).unwrap();

    assert!(matches!(
        reader.next_record().unwrap(),
        ReadOutcome::Corrupt { offset: 0, .. }
    ));
}

#[test]
fn test_unknown_status_is_corrupt() {
    let (_temp, log_path) = setup_temp_log();
    let mut bad = log::encode(3, &[3]).to_vec();
    bad[4] = 9;
    write_log(&log_path, &[log::encode(1, &[1]).to_vec(), bad]);

    let mut reader = LogReader::open(&log_path).unwrap();
    reader.next_record().unwrap();

    assert!(matches!(
        reader.next_record().unwrap(),
        ReadOutcome::Corrupt { offset: 10, .. }
    ));
    assert_eq!(reader.position(), 10);
}
