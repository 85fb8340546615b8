//! Append-only Log Module
//!
//! The log file is the only durable copy of the data.
//!
//! ## Responsibilities
//! - Encode/decode individual records
//! - Append records without ever rewriting acknowledged bytes
//! - Sequential scan that stops cleanly at a truncated or corrupt tail
//! - Rebuild the in-memory index by replaying the log in order
//!
//! ## File Format
//! No header, footer, or version tag. Records are laid end to end,
//! all integers big-endian:
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Record 1                                         │
//! │ ┌─────────┬────────────┬─────────┬─────────────┐ │
//! │ │ Len (4) │ Status (1) │ Key (4) │ Value (Len-9)│ │
//! │ └─────────┴────────────┴─────────┴─────────────┘ │
//! ├──────────────────────────────────────────────────┤
//! │ Record 2 ...                                     │
//! └──────────────────────────────────────────────────┘
//! ```
//! `Len` counts the whole record including itself. Status `0` is a normal
//! insert, `1` a tombstone (which never carries value bytes).

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{
    check_value_len, decode, encode, encode_tombstone, Entry, HEADER_SIZE, MAX_VALUE_LEN,
    STATUS_DELETED, STATUS_NORMAL,
};
pub(crate) use entry::put_record;
pub use writer::LogWriter;
pub use reader::{LogReader, ReadOutcome};
pub use recovery::{Recovery, RecoveryResult, TailDefect};
