//! Benchmarks for the XID ledger.
//!
//! Run with `cargo bench -p xidledger_bench`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
