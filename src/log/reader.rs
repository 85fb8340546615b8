//! Log Reader
//!
//! Reads records sequentially from the start of the log file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::Result;

use super::entry::{Entry, HEADER_SIZE};

/// Size of the length prefix at the start of every record
const LENGTH_SIZE: usize = 4;

/// What the reader found at its current position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete record starting at `offset`
    Record { offset: u64, entry: Entry },

    /// No bytes left: the log ended cleanly
    End,

    /// The record at `offset` needs more bytes than the file holds.
    /// `declared` is `None` when not even the length prefix is complete.
    Truncated {
        offset: u64,
        declared: Option<u64>,
        available: u64,
    },

    /// The record at `offset` is complete but cannot be decoded
    Corrupt { offset: u64, reason: String },
}

/// Reads records from the log file, one at a time, front to back
pub struct LogReader {
    reader: BufReader<File>,
    position: u64,
    file_len: u64,
}

impl LogReader {
    /// Open a log file for reading from position 0
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the record at the current position
    ///
    /// After anything other than `Record` the reader stops: the position is
    /// left at the start of the unreadable record and further calls return
    /// `End`.
    pub fn next_record(&mut self) -> Result<ReadOutcome> {
        let offset = self.position;
        let remaining = self.file_len.saturating_sub(offset);

        if remaining == 0 {
            return Ok(ReadOutcome::End);
        }

        let mut length_bytes = [0u8; LENGTH_SIZE];
        let header_read = read_full(&mut self.reader, &mut length_bytes)?;
        if header_read < LENGTH_SIZE {
            self.file_len = offset;
            return Ok(ReadOutcome::Truncated {
                offset,
                declared: None,
                available: header_read as u64,
            });
        }
        let declared = u32::from_be_bytes(length_bytes) as u64;

        if declared < HEADER_SIZE as u64 {
            self.file_len = offset;
            return Ok(ReadOutcome::Corrupt {
                offset,
                reason: format!(
                    "declared length {} is below the {} byte minimum",
                    declared, HEADER_SIZE
                ),
            });
        }

        // Checked before allocating: a garbage length can claim up to 4 GiB.
        if declared > remaining {
            self.file_len = offset;
            return Ok(ReadOutcome::Truncated {
                offset,
                declared: Some(declared),
                available: remaining,
            });
        }

        let mut record = vec![0u8; declared as usize];
        record[..LENGTH_SIZE].copy_from_slice(&length_bytes);
        let body_read = read_full(&mut self.reader, &mut record[LENGTH_SIZE..])?;
        if body_read < record.len() - LENGTH_SIZE {
            // File shrank underneath us.
            self.file_len = offset;
            return Ok(ReadOutcome::Truncated {
                offset,
                declared: Some(declared),
                available: (LENGTH_SIZE + body_read) as u64,
            });
        }

        match Entry::decode(&record) {
            Ok(entry) => {
                self.position += declared;
                Ok(ReadOutcome::Record { offset, entry })
            }
            Err(e) => {
                self.file_len = offset;
                Ok(ReadOutcome::Corrupt {
                    offset,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Offset just past the last complete record returned
    pub fn position(&self) -> u64 {
        self.position
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
