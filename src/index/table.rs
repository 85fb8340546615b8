//! Index implementation
//!
//! HashMap-based index tracking live values and their total size.

use std::collections::HashMap;

use crate::log::Entry;

/// Live key → value mapping rebuilt from the log
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    entries: HashMap<i32, Vec<u8>>,
    value_bytes: usize,
}

impl Index {
    /// Create a new empty Index
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the live value for `key`
    pub fn get(&self, key: i32) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.entries.contains_key(&key)
    }

    /// Insert or overwrite `key`, returning the previous value
    pub fn insert(&mut self, key: i32, value: Vec<u8>) -> Option<Vec<u8>> {
        self.value_bytes += value.len();
        let previous = self.entries.insert(key, value);
        if let Some(old) = &previous {
            self.value_bytes -= old.len();
        }
        previous
    }

    /// Remove `key`, returning its value if it was live
    pub fn remove(&mut self, key: i32) -> Option<Vec<u8>> {
        let removed = self.entries.remove(&key);
        if let Some(old) = &removed {
            self.value_bytes -= old.len();
        }
        removed
    }

    /// Replay one log record
    ///
    /// Normal records overwrite unconditionally; tombstones for absent keys
    /// are no-ops.
    pub fn apply(&mut self, entry: Entry) {
        match entry {
            Entry::Normal { key, value } => {
                self.insert(key, value);
            }
            Entry::Deleted { key } => {
                self.remove(key);
            }
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of all live values in bytes
    pub fn value_bytes(&self) -> usize {
        self.value_bytes
    }

    /// Live entries in ascending key order
    pub fn sorted_entries(&self) -> Vec<(i32, &[u8])> {
        let mut entries: Vec<(i32, &[u8])> = self
            .entries
            .iter()
            .map(|(key, value)| (*key, value.as_slice()))
            .collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.entries.shrink_to_fit();
        self.value_bytes = 0;
    }
}
