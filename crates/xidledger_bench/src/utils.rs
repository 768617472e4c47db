//! Benchmark utilities.

use rand::Rng;
use xidledger_core::{LedgerConfig, TransactionManager, Xid};
use xidledger_storage::InMemoryBackend;

/// Generate a raw ledger image holding `count` random statuses.
pub fn random_image(count: u64) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut data = count.to_be_bytes().to_vec();
    data.extend((0..count).map(|_| rng.gen_range(0u8..=2)));
    data
}

/// Open an in-memory ledger with `count` transactions already allocated.
pub fn populated_memory_ledger(count: u64) -> TransactionManager {
    TransactionManager::with_backend(
        Box::new(InMemoryBackend::with_data(random_image(count))),
        &LedgerConfig::default(),
    )
    .expect("Failed to open in-memory ledger")
}

/// Pick `count` random XIDs in `1..=last`.
pub fn random_xids(last: u64, count: usize) -> Vec<Xid> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| Xid::new(rng.gen_range(1..=last))).collect()
}
