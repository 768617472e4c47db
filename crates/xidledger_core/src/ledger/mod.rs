//! The on-disk transaction status ledger.
//!
//! ## File Format
//!
//! ```text
//! | counter (8, big-endian) | status(xid 1) | status(xid 2) | ... | status(xid N) |
//! ```
//!
//! `counter` is the highest XID ever allocated. Each allocated XID owns one
//! status byte: `0 = ACTIVE`, `1 = COMMITTED`, `2 = ABORTED`.
//!
//! ## Validation Policy
//!
//! At rest the file is exactly `8 + counter` bytes long. Open checks this
//! and refuses the ledger on any mismatch, including a file shorter than the
//! header. No heuristic repair is attempted; the one exception is the opt-in
//! rollback of an interrupted `begin` (see
//! [`LedgerConfig::recover_interrupted_begin`](crate::LedgerConfig)).
//!
//! ## Invariants
//!
//! - Every write is followed by `sync` before it is acknowledged
//! - A status record is written before the counter that covers it
//! - Records are never deleted; the ledger only grows

mod layout;
mod store;

pub use layout::{
    expected_len, ledger_path, lock_path, record_offset, HEADER_SIZE, LEDGER_SUFFIX, RECORD_SIZE,
};
pub use store::LedgerStore;
