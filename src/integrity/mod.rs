//! Integrity Module
//!
//! Detects damage to the log between sessions.
//!
//! ## Responsibilities
//! - Compute an MD5 digest over the live index contents
//! - Check it against the meta file when a store is opened
//! - Replace the meta file with a fresh digest on clean close
//!
//! ## Checksum Basis
//! Every live entry is re-encoded as a normal log record and fed to MD5 in
//! ascending key order. The order is part of the on-disk contract: any
//! implementation reading the same file pair must produce the same digest.
//!
//! ## Meta File Format
//! ```text
//! ┌────────────────────────┐
//! │ empty  |  MD5 (16)     │
//! └────────────────────────┘
//! ```

mod checksum;
mod meta;

pub use checksum::{checksum, Digest, DIGEST_LEN};
pub use meta::{MetaFile, StoredChecksum};

use tracing::debug;

use crate::error::{KvError, Result};
use crate::index::Index;

/// What the open-time check established about the rebuilt index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Non-empty index whose digest equals the stored one
    Matched,

    /// Empty index, and the meta file records no data either: it is empty or
    /// holds the digest of an empty index
    Empty,

    /// Empty index, but the meta file holds some other content. The log may
    /// have lost data the last clean close recorded.
    Unvouched,
}

impl Verification {
    /// Whether the meta file agrees with what the log replayed
    pub fn is_vouched(self) -> bool {
        !matches!(self, Verification::Unvouched)
    }
}

/// Open-time check of a freshly rebuilt index against the meta file
///
/// An empty index needs no checksum and is never reported as damaged; the
/// result tells the caller whether the meta file agreed with it. Otherwise
/// the meta file must hold exactly one digest equal to the one computed from
/// `index`.
pub fn verify(index: &Index, meta: &MetaFile) -> Result<Verification> {
    let stored = meta.load()?;

    if index.is_empty() {
        let verification = match stored {
            StoredChecksum::Empty => Verification::Empty,
            StoredChecksum::Digest(digest) if digest == checksum(index) => Verification::Empty,
            StoredChecksum::Digest(_) | StoredChecksum::Malformed(_) => Verification::Unvouched,
        };
        debug!(?verification, "index empty, skipping checksum verification");
        return Ok(verification);
    }

    let expected = match stored {
        StoredChecksum::Digest(digest) => digest,
        StoredChecksum::Empty => {
            return Err(KvError::StorageDamaged(format!(
                "log holds {} live keys but meta file {} has no checksum",
                index.len(),
                meta.path().display()
            )));
        }
        StoredChecksum::Malformed(len) => {
            return Err(KvError::StorageDamaged(format!(
                "meta file {} is {} bytes, expected {}",
                meta.path().display(),
                len,
                DIGEST_LEN
            )));
        }
    };

    let actual = checksum(index);
    if actual != expected {
        return Err(KvError::StorageDamaged(format!(
            "checksum mismatch: meta {} but log gives {}",
            hex(&expected),
            hex(&actual)
        )));
    }

    debug!(checksum = %hex(&actual), "checksum verified");
    Ok(Verification::Matched)
}

/// Close-time step: recompute the digest and replace the meta file with it
pub fn seal(index: &Index, meta: &MetaFile) -> Result<Digest> {
    let digest = checksum(index);
    meta.store(&digest)?;
    debug!(checksum = %hex(&digest), keys = index.len(), "meta checksum written");
    Ok(digest)
}

/// Lowercase hex rendering of a digest
pub fn hex(digest: &Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
