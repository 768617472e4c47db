//! # XID Ledger Storage
//!
//! Storage backend trait and implementations for the XID ledger.
//!
//! Backends are **opaque positional byte stores**. They know nothing about
//! the ledger header or status records; `xidledger_core` owns all format
//! interpretation.
//!
//! ## Design Principles
//!
//! - Backends read and write bytes at explicit offsets
//! - Writes may extend the store, but never leave a gap
//! - `sync` is the durability barrier; nothing is durable before it returns
//! - Must be `Send + Sync`; all methods take `&self` and lock internally
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral ledgers
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use xidledger_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.write_at(0, b"hello world").unwrap();
//! backend.write_at(6, b"WORLD").unwrap();
//! assert_eq!(backend.read_at(0, 11).unwrap(), b"hello WORLD");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
