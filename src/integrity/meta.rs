//! Meta file access
//!
//! The meta file is either empty or holds exactly one digest. It is never
//! updated in place: every store replaces its whole content.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::checksum::{Digest, DIGEST_LEN};

/// Contents of the meta file as found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredChecksum {
    /// Zero bytes: no clean close has recorded a checksum yet
    Empty,

    /// Exactly one digest
    Digest(Digest),

    /// Any other length
    Malformed(u64),
}

/// Handle on the meta file path
#[derive(Debug, Clone)]
pub struct MetaFile {
    path: PathBuf,
}

impl MetaFile {
    /// Open the meta file, creating it empty if absent
    pub fn open(path: &Path) -> Result<Self> {
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Read the stored checksum
    pub fn load(&self) -> Result<StoredChecksum> {
        let bytes = fs::read(&self.path)?;

        Ok(match bytes.len() {
            0 => StoredChecksum::Empty,
            DIGEST_LEN => {
                let mut digest = [0u8; DIGEST_LEN];
                digest.copy_from_slice(&bytes);
                StoredChecksum::Digest(digest)
            }
            len => StoredChecksum::Malformed(len as u64),
        })
    }

    /// Replace the meta file content with `digest` and sync it
    pub fn store(&self, digest: &Digest) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(digest)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
