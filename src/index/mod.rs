//! Index Module
//!
//! In-memory map from key to its current live value.
//!
//! ## Responsibilities
//! - O(1) point lookups for `read`
//! - Apply inserts and tombstones, in log order, during recovery
//! - Hand out entries in ascending key order for the integrity checksum
//!
//! ## Data Structure Choice
//! `HashMap<i32, Vec<u8>>`. Deleted keys are removed outright rather than
//! kept as tombstones: the log is the only history, and the index is thrown
//! away and rebuilt on every open.

mod table;

pub use table::Index;
