//! # kvlog
//!
//! An embedded, single-process key-value store with:
//! - `i32` keys and arbitrary byte-array values
//! - A single append-only log file as the only copy of the data
//! - Index rebuilt by replaying the log on every open
//! - MD5 integrity checksum kept in a companion meta file
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                               │
//! │          open / read / persist / delete / close             │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌─────────────────┐  ┌─────────────┐   ┌─────────────────┐
//!   │       Log       │  │    Index    │   │    Integrity    │
//!   │ codec / writer  │─▶│  (HashMap)  │──▶│  MD5 + meta     │
//!   │ reader/recovery │  └─────────────┘   └─────────────────┘
//!   └─────────────────┘
//!            │                                      │
//!            ▼                                      ▼
//!       storage.kvs                          storage.kvs.meta
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvlog::Engine;
//!
//! # fn main() -> kvlog::Result<()> {
//! let mut engine = Engine::open_paths("storage.kvs", "storage.kvs.meta")?;
//! engine.persist(6, &[1, 0xF9, 42])?;
//! assert_eq!(engine.read(6)?, Some(&[1, 0xF9, 42][..]));
//! engine.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod index;
pub mod integrity;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, SyncPolicy, TailPolicy};
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
