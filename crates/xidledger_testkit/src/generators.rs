//! Property-based test generators using proptest.
//!
//! Provides strategies for operation sequences and raw ledger images.

use crate::crash::LedgerOp;
use crate::fixtures::ledger_bytes;
use proptest::prelude::*;

/// Strategy for a single operation.
///
/// Commit/abort targets are drawn from `1..=max_xid`, so sequences include
/// unknown XIDs and repeated finishes as well as valid lifecycles.
pub fn ledger_op_strategy(max_xid: u64) -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        2 => Just(LedgerOp::Begin),
        1 => (1..=max_xid).prop_map(LedgerOp::Commit),
        1 => (1..=max_xid).prop_map(LedgerOp::Abort),
    ]
}

/// Strategy for operation sequences of up to `max_len` steps.
pub fn ledger_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    let max_xid = (max_len as u64).max(1) + 2;
    prop::collection::vec(ledger_op_strategy(max_xid), 0..max_len)
}

/// Strategy for a valid status byte.
pub fn status_byte_strategy() -> impl Strategy<Value = u8> {
    0u8..=2
}

/// Strategy for a well-formed ledger image and its counter.
pub fn valid_image_strategy() -> impl Strategy<Value = (u64, Vec<u8>)> {
    prop::collection::vec(status_byte_strategy(), 0..64).prop_map(|statuses| {
        let counter = statuses.len() as u64;
        (counter, ledger_bytes(counter, &statuses))
    })
}

/// Strategy for an image whose length disagrees with its counter.
pub fn mismatched_image_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        // Truncated header.
        prop::collection::vec(any::<u8>(), 0..8),
        // Counter and record count disagree.
        (0u64..64, prop::collection::vec(status_byte_strategy(), 0..64))
            .prop_filter("lengths must differ", |(counter, statuses)| {
                *counter != statuses.len() as u64
            })
            .prop_map(|(counter, statuses)| ledger_bytes(counter, &statuses)),
    ]
}
