//! # XID Ledger Core
//!
//! The transaction status ledger of a storage engine: the durable record of
//! whether each transaction is running, committed, or aborted.
//!
//! This crate provides:
//! - [`TransactionManager`] - XID allocation and the status API
//! - [`LedgerStore`] - byte-level ledger access and startup validation
//! - [`LedgerConfig`] - open/create behavior
//! - [`LedgerLock`] - exclusive ownership of a ledger file
//!
//! ## Example
//!
//! ```rust
//! use xidledger_core::{LedgerConfig, TransactionManager, Xid};
//! use xidledger_storage::InMemoryBackend;
//!
//! let tm = TransactionManager::with_backend(
//!     Box::new(InMemoryBackend::new()),
//!     &LedgerConfig::default(),
//! )
//! .unwrap();
//!
//! let xid = tm.begin().unwrap();
//! assert_eq!(xid, Xid::new(1));
//! assert!(tm.is_active(xid).unwrap());
//!
//! tm.commit(xid).unwrap();
//! assert!(tm.is_commit(xid).unwrap());
//! assert!(tm.is_commit(Xid::SUPER).unwrap());
//!
//! tm.close().unwrap();
//! assert!(tm.begin().is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod ledger;
mod lock;
pub mod transaction;
mod types;

pub use config::LedgerConfig;
pub use error::{CoreError, CoreResult};
pub use ledger::LedgerStore;
pub use lock::LedgerLock;
pub use transaction::{TransactionManager, TransactionStatus};
pub use types::Xid;
