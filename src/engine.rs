//! Engine Module
//!
//! The storage engine that ties the log, the index, and the integrity
//! checksum together.
//!
//! ## Responsibilities
//! - Recover the index from the log on open and verify it against the meta file
//! - Append a record for every mutation before touching the index
//! - Rewrite the meta checksum on clean close
//! - Reject every operation once closed

use std::fs::OpenOptions;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::index::Index;
use crate::integrity::{self, MetaFile, Verification};
use crate::log::{self, LogWriter, Recovery, RecoveryResult, TailDefect};

/// Where the engine is in its lifecycle
enum State {
    /// Accepting reads and writes
    Writable(LogWriter),

    /// The log ends in a corrupt record that was left in place. Reads are
    /// served from the index; nothing is written to either file.
    ReadOnly(TailDefect),

    Closed,
}

/// The main storage engine
///
/// ## Lifecycle: `Open → Closed`
///
/// - [`Engine::open`] returns an engine in the open state, or an error with
///   every file handle already released.
/// - An open engine is normally writable. If the log ends in a corrupt
///   record it is opened read-only instead: `persist` and `delete` return
///   [`KvError::StorageDamaged`] and `close` leaves the meta file alone.
/// - [`Engine::close`] moves it to closed. After that `read`, `persist`,
///   `delete`, and a second `close` all return [`KvError::Closed`].
/// - Dropping an engine that is still open closes it on a best-effort basis.
///
/// ## Concurrency
/// None. Mutations take `&mut self`; sharing one file pair between engines,
/// threads, or processes is unsupported.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Live key → value map, rebuilt from the log on open
    index: Index,

    /// Checksum file, read at open and rewritten at close
    meta: MetaFile,

    state: State,

    /// Statistics from the open-time log scan
    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the log and meta files if absent
    /// 2. Replay the log into a fresh index
    /// 3. Verify the index against the meta checksum
    /// 4. Settle any unreadable tail and open the log for appending
    ///
    /// A truncated tail is trimmed only once the meta file has vouched for
    /// the records before it. A corrupt record is never removed.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Make sure both files exist
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.storage_path)?;
        let meta = MetaFile::open(&config.meta_path)?;

        // Step 2: Rebuild the index from the log
        let (index, recovery) = Recovery::rebuild(&config.storage_path, config.tail_policy)?;

        // Step 3: Integrity check
        let verification = integrity::verify(&index, &meta)?;

        // Step 4: Only touch the log after the data has been verified
        let state = match &recovery.tail {
            None => State::Writable(LogWriter::open(&config.storage_path, config.sync_policy)?),
            Some(defect) if !verification.is_vouched() => {
                return Err(KvError::StorageDamaged(format!(
                    "{} left no readable records, but meta file {} records data",
                    defect,
                    config.meta_path.display()
                )));
            }
            Some(TailDefect::Truncated { .. }) => State::Writable(LogWriter::open_at(
                &config.storage_path,
                recovery.valid_len,
                config.sync_policy,
            )?),
            Some(defect @ TailDefect::Corrupt { .. }) => {
                warn!(
                    storage = %config.storage_path.display(),
                    offset = defect.offset(),
                    "log ends in a corrupt record, opening read-only"
                );
                State::ReadOnly(defect.clone())
            }
        };

        info!(
            storage = %config.storage_path.display(),
            records = recovery.records_replayed,
            live_keys = index.len(),
            value_bytes = index.value_bytes(),
            vouched = verification == Verification::Matched,
            writable = matches!(state, State::Writable(_)),
            "storage opened"
        );

        Ok(Self {
            config,
            index,
            meta,
            state,
            recovery,
        })
    }

    /// Open with explicit file paths and default policies
    pub fn open_paths(storage_path: impl AsRef<Path>, meta_path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::new(
            storage_path.as_ref(),
            meta_path.as_ref(),
        ))
    }

    /// Open `storage.kvs` / `storage.kvs.meta` in the working directory
    pub fn open_default() -> Result<Self> {
        Self::open(Config::default())
    }

    /// Get the live value for `key`
    ///
    /// Pure in-memory lookup; never touches the files.
    pub fn read(&self, key: i32) -> Result<Option<&[u8]>> {
        self.ensure_open()?;
        Ok(self.index.get(key))
    }

    /// Store `value` under `key`, replacing any previous value
    ///
    /// The index is updated only after the record has been appended.
    pub fn persist(&mut self, key: i32, value: &[u8]) -> Result<()> {
        let writer = self.writer()?;

        log::check_value_len(value.len())?;

        let record = log::encode(key, value);
        writer.append(&record)?;

        self.index.insert(key, value.to_vec());
        Ok(())
    }

    /// Delete `key`
    ///
    /// Deleting an absent key succeeds without writing anything.
    pub fn delete(&mut self, key: i32) -> Result<()> {
        let writer = match &mut self.state {
            State::Writable(writer) => writer,
            State::ReadOnly(defect) => return Err(read_only_error(defect)),
            State::Closed => return Err(KvError::Closed),
        };

        if !self.index.contains_key(key) {
            return Ok(());
        }

        let record = log::encode_tombstone(key);
        writer.append(&record)?;

        self.index.remove(key);
        Ok(())
    }

    /// Close the store
    ///
    /// Syncs the log, then replaces the meta checksum with one computed from
    /// the final index. A read-only engine writes nothing. The engine is
    /// closed afterwards even if this fails.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Writable(writer) => {
                let appended = writer.records_appended();

                writer.finish()?;
                let digest = integrity::seal(&self.index, &self.meta)?;

                info!(
                    storage = %self.config.storage_path.display(),
                    appended,
                    live_keys = self.index.len(),
                    value_bytes = self.index.value_bytes(),
                    checksum = %integrity::hex(&digest),
                    "storage closed"
                );
            }
            State::ReadOnly(defect) => {
                info!(
                    storage = %self.config.storage_path.display(),
                    corrupt_offset = defect.offset(),
                    "read-only storage closed, meta file left unchanged"
                );
            }
            State::Closed => return Err(KvError::Closed),
        }

        self.index.clear();
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Whether the engine still accepts operations
    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    /// Whether the engine accepts `persist` and `delete`
    pub fn is_writable(&self) -> bool {
        matches!(self.state, State::Writable(_))
    }

    /// Number of live keys (0 once closed)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `key` is live (false once closed)
    pub fn contains_key(&self, key: i32) -> bool {
        self.index.contains_key(key)
    }

    /// Current log length in bytes, if writable
    pub fn log_len(&self) -> Option<u64> {
        match &self.state {
            State::Writable(writer) => Some(writer.len()),
            State::ReadOnly(_) | State::Closed => None,
        }
    }

    /// Statistics from the log scan done at open
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(KvError::Closed)
        }
    }

    fn writer(&mut self) -> Result<&mut LogWriter> {
        match &mut self.state {
            State::Writable(writer) => Ok(writer),
            State::ReadOnly(defect) => Err(read_only_error(defect)),
            State::Closed => Err(KvError::Closed),
        }
    }
}

fn read_only_error(defect: &TailDefect) -> KvError {
    KvError::StorageDamaged(format!(
        "log is read-only: corrupt record at offset {} was left in place",
        defect.offset()
    ))
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!(
                    storage = %self.config.storage_path.display(),
                    error = %e,
                    "failed to close storage on drop"
                );
            }
        }
    }
}
