//! Configuration for kvlog
//!
//! Two file paths plus the durability and recovery policies, with defaults
//! matching the historical `storage.kvs` / `storage.kvs.meta` layout.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Default log file name, relative to the working directory
pub const DEFAULT_STORAGE_FILE: &str = "storage.kvs";

/// Default meta file name, relative to the working directory
pub const DEFAULT_META_FILE: &str = "storage.kvs.meta";

/// Main configuration for a kvlog instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------
    /// Append-only log holding every record ever written
    pub storage_path: PathBuf,

    /// Meta file holding the 16-byte checksum from the last clean close
    pub meta_path: PathBuf,

    // -------------------------------------------------------------------------
    // Policies
    // -------------------------------------------------------------------------
    /// When appended records are fsynced
    pub sync_policy: SyncPolicy,

    /// What recovery does with an unreadable suffix of the log
    pub tail_policy: TailPolicy,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// fsync only at a clean close
    #[default]
    OnClose,

    /// fsync after every append (safest, slowest)
    EveryWrite,
}

/// Recovery behavior for a truncated or corrupt record at the end of the scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TailPolicy {
    /// Drop the defect and everything after it, then trim the log file back
    /// to the last complete record once the checksum has been verified.
    #[default]
    Discard,

    /// Refuse to open with `StorageDamaged`.
    Reject,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
            meta_path: PathBuf::from(DEFAULT_META_FILE),
            sync_policy: SyncPolicy::default(),
            tail_policy: TailPolicy::default(),
        }
    }
}

impl Config {
    /// Config for the given file pair with default policies
    pub fn new(storage_path: impl Into<PathBuf>, meta_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            meta_path: meta_path.into(),
            ..Self::default()
        }
    }

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(KvError::Config("storage path is empty".to_string()));
        }
        if self.meta_path.as_os_str().is_empty() {
            return Err(KvError::Config("meta path is empty".to_string()));
        }
        if self.storage_path == self.meta_path {
            return Err(KvError::Config(format!(
                "storage and meta paths must differ: {}",
                self.storage_path.display()
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = path.into();
        self
    }

    /// Set the meta file path
    pub fn meta_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.meta_path = path.into();
        self
    }

    /// Set the sync policy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Set the tail policy
    pub fn tail_policy(mut self, policy: TailPolicy) -> Self {
        self.config.tail_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
