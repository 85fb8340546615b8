//! Index checksum
//!
//! MD5 over the live entries, each re-encoded as a normal record, in
//! ascending key order.

use bytes::BytesMut;

use crate::index::Index;
use crate::log::{put_record, HEADER_SIZE, STATUS_NORMAL};

/// Size of an MD5 digest
pub const DIGEST_LEN: usize = 16;

/// Raw MD5 digest bytes
pub type Digest = [u8; DIGEST_LEN];

/// Compute the checksum of the index contents
pub fn checksum(index: &Index) -> Digest {
    let mut context = md5::Context::new();
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + 256);

    for (key, value) in index.sorted_entries() {
        buf.clear();
        put_record(&mut buf, STATUS_NORMAL, key, value);
        context.consume(&buf);
    }

    context.compute().0
}
