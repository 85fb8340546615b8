//! Integrity Tests
//!
//! Tests verify:
//! - Checksum is independent of insertion order
//! - Checksum changes with any key or value change
//! - Meta file load/store
//! - Open-time verification outcomes

use std::fs;
use std::path::PathBuf;

use kvlog::index::Index;
use kvlog::integrity::{self, checksum, MetaFile, StoredChecksum, Verification, DIGEST_LEN};
use kvlog::log;
use kvlog::KvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_meta() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let meta_path = temp_dir.path().join("test.kvs.meta");
    (temp_dir, meta_path)
}

fn sample_index() -> Index {
    let mut index = Index::new();
    index.insert(6, vec![1, 0xF9, 42, 3, 8, 1]);
    index.insert(-800, vec![9]);
    index.insert(777, vec![0xCE, 43, 1, 0, 0, 62, 8]);
    index
}

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_checksum_ignores_insertion_order() {
    let mut reversed = Index::new();
    reversed.insert(777, vec![0xCE, 43, 1, 0, 0, 62, 8]);
    reversed.insert(-800, vec![9]);
    reversed.insert(6, vec![1, 0xF9, 42, 3, 8, 1]);

    assert_eq!(checksum(&sample_index()), checksum(&reversed));
}

#[test]
fn test_checksum_is_md5_of_sorted_records() {
    let mut expected = Vec::new();
    expected.extend_from_slice(&log::encode(-800, &[9]));
    expected.extend_from_slice(&log::encode(6, &[1, 0xF9, 42, 3, 8, 1]));
    expected.extend_from_slice(&log::encode(777, &[0xCE, 43, 1, 0, 0, 62, 8]));

    assert_eq!(checksum(&sample_index()), md5::compute(&expected).0);
}

#[test]
fn test_checksum_detects_value_change() {
    let mut changed = sample_index();
    changed.insert(-800, vec![10]);

    assert_ne!(checksum(&sample_index()), checksum(&changed));
}

#[test]
fn test_checksum_detects_key_change() {
    let mut a = Index::new();
    a.insert(1, vec![5]);
    let mut b = Index::new();
    b.insert(2, vec![5]);

    assert_ne!(checksum(&a), checksum(&b));
}

#[test]
fn test_hex_rendering() {
    let digest = checksum(&Index::new());
    assert_eq!(integrity::hex(&digest), "d41d8cd98f00b204e9800998ecf8427e");
}

// =============================================================================
// Meta File Tests
// =============================================================================

#[test]
fn test_meta_open_creates_empty_file() {
    let (_temp, meta_path) = setup_temp_meta();

    let meta = MetaFile::open(&meta_path).unwrap();

    assert!(meta_path.exists());
    assert_eq!(meta.load().unwrap(), StoredChecksum::Empty);
}

#[test]
fn test_meta_open_keeps_existing_content() {
    let (_temp, meta_path) = setup_temp_meta();
    fs::write(&meta_path, [7u8; DIGEST_LEN]).unwrap();

    let meta = MetaFile::open(&meta_path).unwrap();

    assert_eq!(meta.load().unwrap(), StoredChecksum::Digest([7u8; DIGEST_LEN]));
}

#[test]
fn test_meta_store_replaces_content() {
    let (_temp, meta_path) = setup_temp_meta();
    fs::write(&meta_path, [1u8; 40]).unwrap();
    let meta = MetaFile::open(&meta_path).unwrap();
    assert_eq!(meta.load().unwrap(), StoredChecksum::Malformed(40));

    meta.store(&[2u8; DIGEST_LEN]).unwrap();

    assert_eq!(fs::read(&meta_path).unwrap(), vec![2u8; DIGEST_LEN]);
}

// =============================================================================
// Verification Tests
// =============================================================================

#[test]
fn test_verify_skips_empty_index() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();

    assert_eq!(
        integrity::verify(&Index::new(), &meta).unwrap(),
        Verification::Empty
    );
}

#[test]
fn test_verify_empty_index_after_sealing_nothing() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();
    integrity::seal(&Index::new(), &meta).unwrap();

    assert_eq!(
        integrity::verify(&Index::new(), &meta).unwrap(),
        Verification::Empty
    );
}

#[test]
fn test_verify_empty_index_against_stored_data() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();
    integrity::seal(&sample_index(), &meta).unwrap();

    let verification = integrity::verify(&Index::new(), &meta).unwrap();

    assert_eq!(verification, Verification::Unvouched);
    assert!(!verification.is_vouched());
}

#[test]
fn test_verify_empty_index_with_short_meta() {
    let (_temp, meta_path) = setup_temp_meta();
    fs::write(&meta_path, [0u8; 3]).unwrap();
    let meta = MetaFile::open(&meta_path).unwrap();

    assert_eq!(
        integrity::verify(&Index::new(), &meta).unwrap(),
        Verification::Unvouched
    );
}

#[test]
fn test_verify_after_seal() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();
    let index = sample_index();

    let digest = integrity::seal(&index, &meta).unwrap();

    assert_eq!(digest, checksum(&index));
    assert_eq!(integrity::verify(&index, &meta).unwrap(), Verification::Matched);
}

#[test]
fn test_verify_empty_meta_with_data() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();

    let result = integrity::verify(&sample_index(), &meta);

    assert!(matches!(result, Err(KvError::StorageDamaged(_))));
}

#[test]
fn test_verify_short_meta_with_data() {
    let (_temp, meta_path) = setup_temp_meta();
    fs::write(&meta_path, [0u8; 8]).unwrap();
    let meta = MetaFile::open(&meta_path).unwrap();

    let result = integrity::verify(&sample_index(), &meta);

    assert!(matches!(result, Err(KvError::StorageDamaged(_))));
}

#[test]
fn test_verify_mismatch() {
    let (_temp, meta_path) = setup_temp_meta();
    let meta = MetaFile::open(&meta_path).unwrap();
    integrity::seal(&sample_index(), &meta).unwrap();

    let mut changed = sample_index();
    changed.remove(6);

    let result = integrity::verify(&changed, &meta);
    assert!(matches!(result, Err(KvError::StorageDamaged(_))));
}
