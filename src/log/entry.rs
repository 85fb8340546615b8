//! Log Entry definitions
//!
//! Defines the structure of individual log records and their fixed binary
//! layout.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{KvError, Result};

/// Fixed part of every record: length (4) + status (1) + key (4)
pub const HEADER_SIZE: usize = 9;

/// Status byte of an insert record
pub const STATUS_NORMAL: u8 = 0;

/// Status byte of a tombstone record
pub const STATUS_DELETED: u8 = 1;

/// Largest value whose record length still fits the u32 length field
pub const MAX_VALUE_LEN: usize = u32::MAX as usize - HEADER_SIZE;

/// A single record in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Insert or overwrite `key`
    Normal { key: i32, value: Vec<u8> },

    /// Tombstone for `key`
    Deleted { key: i32 },
}

impl Entry {
    /// Key this record applies to
    pub fn key(&self) -> i32 {
        match self {
            Entry::Normal { key, .. } | Entry::Deleted { key } => *key,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Entry::Deleted { .. })
    }

    /// Serialized size, including the length field itself
    pub fn encoded_len(&self) -> usize {
        match self {
            Entry::Normal { value, .. } => HEADER_SIZE + value.len(),
            Entry::Deleted { .. } => HEADER_SIZE,
        }
    }

    /// Serialize into a fresh buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the serialized record to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Entry::Normal { key, value } => put_record(buf, STATUS_NORMAL, *key, value),
            Entry::Deleted { key } => put_record(buf, STATUS_DELETED, *key, &[]),
        }
    }

    /// Deserialize exactly one record
    ///
    /// `bytes` must hold the whole record and nothing else.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(KvError::CorruptRecord(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut buf = bytes;
        let length = buf.get_u32() as usize;
        if length != bytes.len() {
            return Err(KvError::CorruptRecord(format!(
                "Length mismatch: record declares {} bytes, got {}",
                length,
                bytes.len()
            )));
        }

        let status = buf.get_u8();
        let key = buf.get_i32();

        match status {
            STATUS_NORMAL => Ok(Entry::Normal {
                key,
                value: buf.to_vec(),
            }),
            STATUS_DELETED if buf.has_remaining() => Err(KvError::CorruptRecord(format!(
                "Tombstone for key {} carries {} value bytes",
                key,
                buf.remaining()
            ))),
            STATUS_DELETED => Ok(Entry::Deleted { key }),
            other => Err(KvError::CorruptRecord(format!(
                "Unknown status byte: {:#04x}",
                other
            ))),
        }
    }
}

/// Encode a normal record for `key` → `value`
///
/// Callers must keep `value` within [`MAX_VALUE_LEN`].
pub fn encode(key: i32, value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + value.len());
    put_record(&mut buf, STATUS_NORMAL, key, value);
    buf.freeze()
}

/// Encode a tombstone record for `key`
pub fn encode_tombstone(key: i32) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE);
    put_record(&mut buf, STATUS_DELETED, key, &[]);
    buf.freeze()
}

/// Reject a value whose record length would overflow the u32 length field
pub fn check_value_len(len: usize) -> Result<()> {
    if len > MAX_VALUE_LEN {
        return Err(KvError::ValueTooLarge(len));
    }
    Ok(())
}

/// Decode one complete record
pub fn decode(bytes: &[u8]) -> Result<Entry> {
    Entry::decode(bytes)
}

/// Write one record with a borrowed value into `buf`
pub(crate) fn put_record(buf: &mut BytesMut, status: u8, key: i32, value: &[u8]) {
    debug_assert!(value.len() <= MAX_VALUE_LEN);
    buf.reserve(HEADER_SIZE + value.len());
    buf.put_u32((HEADER_SIZE + value.len()) as u32);
    buf.put_u8(status);
    buf.put_i32(key);
    buf.put_slice(value);
}
