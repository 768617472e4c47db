//! # XID Ledger Testkit
//!
//! Test utilities for the XID ledger.
//!
//! This crate provides:
//! - Fixtures for in-memory and file-backed ledgers
//! - A crash-injecting storage backend that models what survives a crash
//! - Concurrent stress runners
//! - Property-based generators for operation sequences
//! - A reference model that checks a manager against expected statuses
//!
//! ## Usage
//!
//! ```rust
//! use xidledger_testkit::prelude::*;
//!
//! with_memory_ledger(|tm| {
//!     let xid = tm.begin().unwrap();
//!     tm.commit(xid).unwrap();
//!     assert!(tm.is_commit(xid).unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
