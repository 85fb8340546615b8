//! Log Writer
//!
//! Handles appending records to the log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SyncPolicy;
use crate::error::{KvError, Result};

/// Appends encoded records to the end of the log file
///
/// The file is opened in append mode, so every write lands at the current end
/// of file. `len` tracks the size covered by acknowledged appends and is the
/// point a failed append is rolled back to. If that rollback fails the writer
/// is poisoned and refuses every later append.
pub struct LogWriter {
    file: File,
    path: PathBuf,
    len: u64,
    sync_policy: SyncPolicy,
    records_appended: u64,
    poisoned: bool,
}

impl LogWriter {
    /// Open or create a log file for appending
    pub fn open(path: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
            sync_policy,
            records_appended: 0,
            poisoned: false,
        })
    }

    /// Open a log for appending after cutting it back to `valid_len`
    ///
    /// Used after recovery discarded an unreadable tail: bytes past
    /// `valid_len` were never part of an acknowledged record.
    pub fn open_at(path: &Path, valid_len: u64, sync_policy: SyncPolicy) -> Result<Self> {
        let mut writer = Self::open(path, sync_policy)?;

        if writer.len > valid_len {
            warn!(
                path = %path.display(),
                from = writer.len,
                to = valid_len,
                "trimming unreadable log tail"
            );
            writer.file.set_len(valid_len)?;
            writer.file.sync_all()?;
            writer.len = valid_len;
        }

        Ok(writer)
    }

    /// Append one encoded record
    ///
    /// Returns the offset the record starts at. On failure the file is cut
    /// back to its previous length so no partial record stays behind.
    pub fn append(&mut self, record: &[u8]) -> Result<u64> {
        if self.poisoned {
            return Err(KvError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "log {} has unrolled partial bytes past offset {}",
                    self.path.display(),
                    self.len
                ),
            )));
        }

        let offset = self.len;

        if let Err(e) = self.write_record(record) {
            if let Err(rollback) = self.roll_back(offset) {
                warn!(
                    path = %self.path.display(),
                    offset,
                    error = %rollback,
                    "failed to roll back partial append, refusing further appends"
                );
                self.poisoned = true;
            }
            return Err(e);
        }

        self.len += record.len() as u64;
        self.records_appended += 1;
        debug!(offset, len = record.len(), "appended record");

        Ok(offset)
    }

    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        self.file.write_all(record)?;
        if self.sync_policy == SyncPolicy::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut off whatever part of a failed record reached the file
    fn roll_back(&mut self, offset: u64) -> io::Result<()> {
        if self.file.metadata()?.len() != offset {
            self.file.set_len(offset)?;
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush, sync, and release the file handle
    pub fn finish(mut self) -> Result<()> {
        self.sync()
    }

    /// Current log length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Records appended through this writer since it was opened
    pub fn records_appended(&self) -> u64 {
        self.records_appended
    }

    /// Whether a failed rollback has disabled this writer
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
