//! Log Recovery
//!
//! Rebuilds the index by replaying the whole log on open.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::TailPolicy;
use crate::error::{KvError, Result};
use crate::index::Index;

use super::entry::Entry;
use super::reader::{LogReader, ReadOutcome};

/// Rebuilds in-memory state from the log file
pub struct Recovery;

/// Unreadable suffix found at the end of the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailDefect {
    /// Partial write: the record needs more bytes than the file holds
    Truncated {
        offset: u64,
        declared: Option<u64>,
        available: u64,
    },

    /// Complete bytes that do not form a valid record
    Corrupt { offset: u64, reason: String },
}

impl TailDefect {
    /// Where the unreadable suffix starts
    pub fn offset(&self) -> u64 {
        match self {
            TailDefect::Truncated { offset, .. } | TailDefect::Corrupt { offset, .. } => *offset,
        }
    }
}

impl fmt::Display for TailDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TailDefect::Truncated {
                offset,
                declared: Some(declared),
                available,
            } => write!(
                f,
                "truncated record at offset {}: declares {} bytes, {} available",
                offset, declared, available
            ),
            TailDefect::Truncated {
                offset,
                declared: None,
                available,
            } => write!(
                f,
                "partial length prefix at offset {}: {} of 4 bytes",
                offset, available
            ),
            TailDefect::Corrupt { offset, reason } => {
                write!(f, "corrupt record at offset {}: {}", offset, reason)
            }
        }
    }
}

/// Result of a recovery scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Complete records read, inserts and tombstones together
    pub records_replayed: u64,

    /// Normal records among them
    pub inserts: u64,

    /// Tombstones among them
    pub tombstones: u64,

    /// Keys live after the replay
    pub live_keys: u64,

    /// End offset of the last complete record
    pub valid_len: u64,

    /// Set when the scan stopped before the end of the file
    pub tail: Option<TailDefect>,
}

impl RecoveryResult {
    /// Whether bytes past `valid_len` were dropped
    pub fn was_truncated(&self) -> bool {
        self.tail.is_some()
    }
}

impl Recovery {
    /// Replay a log file into a fresh index
    ///
    /// This will:
    /// 1. Read records front to back
    /// 2. Apply inserts and tombstones in log order
    /// 3. Stop at the first truncated or corrupt record
    /// 4. Apply `policy` to that defect, if any
    ///
    /// The log file itself is never modified here.
    pub fn rebuild(path: &Path, policy: TailPolicy) -> Result<(Index, RecoveryResult)> {
        let mut index = Index::new();
        let result = Self::scan(path, |entry| index.apply(entry))?;
        let result = RecoveryResult {
            live_keys: index.len() as u64,
            ..result
        };

        if let Some(defect) = &result.tail {
            match policy {
                TailPolicy::Reject => {
                    return Err(KvError::StorageDamaged(format!(
                        "log {}: {}",
                        path.display(),
                        defect
                    )));
                }
                TailPolicy::Discard => {
                    warn!(path = %path.display(), %defect, "ignoring unreadable log tail");
                }
            }
        }

        Ok((index, result))
    }

    /// Scan a log file and report statistics without keeping any state
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let mut index = Index::new();
        let result = Self::scan(path, |entry| index.apply(entry))?;
        Ok(RecoveryResult {
            live_keys: index.len() as u64,
            ..result
        })
    }

    /// Shared scan loop: feeds each complete record to `apply`
    fn scan<F>(path: &Path, mut apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(Entry),
    {
        let mut reader = LogReader::open(path)?;
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_record()? {
                ReadOutcome::Record { entry, .. } => {
                    result.records_replayed += 1;
                    if entry.is_deleted() {
                        result.tombstones += 1;
                    } else {
                        result.inserts += 1;
                    }
                    apply(entry);
                }
                ReadOutcome::End => break,
                ReadOutcome::Truncated {
                    offset,
                    declared,
                    available,
                } => {
                    result.tail = Some(TailDefect::Truncated {
                        offset,
                        declared,
                        available,
                    });
                    break;
                }
                ReadOutcome::Corrupt { offset, reason } => {
                    result.tail = Some(TailDefect::Corrupt { offset, reason });
                    break;
                }
            }
        }

        result.valid_len = reader.position();
        debug!(
            path = %path.display(),
            records = result.records_replayed,
            valid_len = result.valid_len,
            "log scan finished"
        );

        Ok(result)
    }
}
