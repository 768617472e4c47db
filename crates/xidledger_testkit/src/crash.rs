//! Crash recovery testing for the XID ledger.
//!
//! [`CrashableBackend`] keeps two images of the ledger: the live bytes that
//! reads observe and the durable bytes as of the last successful `sync`. A
//! simulated crash discards everything not yet synced; reopening over
//! [`CrashableBackend::durable_image`] is what a restarted process sees.
//!
//! ## Test Strategy
//!
//! 1. **Crash at every write** - run a workload, crash at write `k`, reopen
//! 2. **Failed sync** - the write reached the OS but not the disk
//! 3. **Failed reads** - proves a code path never touches storage
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use xidledger_core::{LedgerConfig, TransactionManager};
//! use xidledger_testkit::crash::CrashableBackend;
//!
//! let backend = Arc::new(CrashableBackend::new());
//! let tm = TransactionManager::with_backend(
//!     Box::new(Arc::clone(&backend)),
//!     &LedgerConfig::default(),
//! )
//! .unwrap();
//!
//! backend.crash_after_writes(1);
//! assert!(tm.begin().is_err());
//! assert!(backend.has_crashed());
//! ```

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use xidledger_core::{CoreResult, LedgerConfig, TransactionManager, Xid};
use xidledger_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};

/// A storage backend that can simulate crashes.
#[derive(Debug)]
pub struct CrashableBackend {
    live: InMemoryBackend,
    durable: RwLock<Vec<u8>>,
    writes: AtomicUsize,
    crash_after_writes: AtomicUsize,
    crashed: AtomicBool,
    fail_on_sync: AtomicBool,
    fail_reads: AtomicBool,
}

impl Default for CrashableBackend {
    fn default() -> Self {
        Self::with_data(Vec::new())
    }
}

impl CrashableBackend {
    /// Creates an empty crashable backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a crashable backend whose data is already durable.
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            live: InMemoryBackend::with_data(data.clone()),
            durable: RwLock::new(data),
            writes: AtomicUsize::new(0),
            crash_after_writes: AtomicUsize::new(usize::MAX),
            crashed: AtomicBool::new(false),
            fail_on_sync: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Crashes on the write after `writes` further successful writes.
    pub fn crash_after_writes(&self, writes: usize) {
        let done = self.writes.load(Ordering::SeqCst);
        self.crash_after_writes
            .store(done.saturating_add(writes), Ordering::SeqCst);
    }

    /// Sets whether `sync` should fail (and crash).
    pub fn set_fail_on_sync(&self, fail: bool) {
        self.fail_on_sync.store(fail, Ordering::SeqCst);
    }

    /// Sets whether every read should fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Returns whether the backend has crashed.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Returns the number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the bytes that would survive a crash right now.
    pub fn durable_image(&self) -> Vec<u8> {
        self.durable.read().clone()
    }

    /// Returns the bytes currently visible to reads.
    pub fn live_image(&self) -> Vec<u8> {
        self.live.data()
    }

    fn crash(&self, what: &str) -> StorageError {
        self.crashed.store(true, Ordering::SeqCst);
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("simulated crash during {what}"),
        ))
    }

    fn ensure_running(&self) -> StorageResult<()> {
        if self.has_crashed() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "backend has crashed",
            )));
        }
        Ok(())
    }
}

impl StorageBackend for CrashableBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated read failure",
            )));
        }
        self.live.read_at(offset, len)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> StorageResult<()> {
        self.ensure_running()?;
        let threshold = self.crash_after_writes.load(Ordering::SeqCst);
        if self.writes.load(Ordering::SeqCst) >= threshold {
            return Err(self.crash("write"));
        }
        self.live.write_at(offset, data)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        self.ensure_running()?;
        self.live.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.live.size()
    }

    fn sync(&self) -> StorageResult<()> {
        self.ensure_running()?;
        if self.fail_on_sync.load(Ordering::SeqCst) {
            return Err(self.crash("sync"));
        }
        self.live.sync()?;
        *self.durable.write() = self.live.data();
        Ok(())
    }

    fn truncate(&self, new_size: u64) -> StorageResult<()> {
        self.ensure_running()?;
        self.live.truncate(new_size)?;
        *self.durable.write() = self.live.data();
        Ok(())
    }
}

/// A step of a ledger workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    /// Start a transaction.
    Begin,
    /// Commit the n-th transaction begun by this workload (1-based XID).
    Commit(u64),
    /// Abort the n-th transaction begun by this workload (1-based XID).
    Abort(u64),
}

/// Operations that returned successfully before a crash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acknowledged {
    /// XIDs returned by `begin`.
    pub begun: Vec<Xid>,
    /// XIDs whose `commit` returned.
    pub committed: Vec<Xid>,
    /// XIDs whose `abort` returned.
    pub aborted: Vec<Xid>,
}

/// Runs `ops` until the first error and reports what was acknowledged.
pub fn run_until_failure(tm: &TransactionManager, ops: &[LedgerOp]) -> Acknowledged {
    let mut acked = Acknowledged::default();
    for op in ops {
        let result: CoreResult<()> = match *op {
            LedgerOp::Begin => tm.begin().map(|xid| acked.begun.push(xid)),
            LedgerOp::Commit(raw) => tm
                .commit(Xid::new(raw))
                .map(|()| acked.committed.push(Xid::new(raw))),
            LedgerOp::Abort(raw) => tm
                .abort(Xid::new(raw))
                .map(|()| acked.aborted.push(Xid::new(raw))),
        };
        if result.is_err() {
            break;
        }
    }
    acked
}

/// Outcome of one crash-point run.
#[derive(Debug)]
pub struct CrashRecoveryResult {
    /// Index of the write that crashed.
    pub crash_point: usize,
    /// What the workload saw succeed.
    pub acknowledged: Acknowledged,
    /// The manager reopened over the durable image.
    pub recovered: CoreResult<TransactionManager>,
}

/// Runs `ops` on a fresh ledger, crashing at write `crash_point` (counted
/// after the ledger header is initialized), then reopens the surviving
/// bytes with `config`.
pub fn crash_and_recover(
    ops: &[LedgerOp],
    crash_point: usize,
    config: &LedgerConfig,
) -> CrashRecoveryResult {
    let backend = Arc::new(CrashableBackend::new());
    let tm = TransactionManager::with_backend(Box::new(Arc::clone(&backend)), config)
        .expect("Failed to initialize ledger");

    backend.crash_after_writes(crash_point);
    let acknowledged = run_until_failure(&tm, ops);

    let survivor = CrashableBackend::with_data(backend.durable_image());
    let recovered = TransactionManager::with_backend(Box::new(survivor), config);

    CrashRecoveryResult {
        crash_point,
        acknowledged,
        recovered,
    }
}

/// Counts the writes `ops` performs on a fresh ledger when nothing fails.
pub fn count_writes(ops: &[LedgerOp]) -> usize {
    let backend = Arc::new(CrashableBackend::new());
    let tm = TransactionManager::with_backend(
        Box::new(Arc::clone(&backend)),
        &LedgerConfig::default(),
    )
    .expect("Failed to initialize ledger");

    let start = backend.write_count();
    run_until_failure(&tm, ops);
    backend.write_count() - start
}

#[cfg(test)]
mod tests {
    use super::*;
    use xidledger_core::CoreError;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn workload() -> Vec<LedgerOp> {
        vec![
            LedgerOp::Begin,
            LedgerOp::Begin,
            LedgerOp::Commit(1),
            LedgerOp::Begin,
            LedgerOp::Abort(2),
            LedgerOp::Commit(3),
            LedgerOp::Begin,
        ]
    }

    /// Every acknowledged operation is visible after recovery.
    fn assert_acknowledged_survive(tm: &TransactionManager, acked: &Acknowledged) {
        let last = tm.last_xid().unwrap();
        for xid in &acked.begun {
            assert!(*xid <= last, "{xid} lost, last is {last}");
        }
        for xid in &acked.committed {
            assert!(tm.is_commit(*xid).unwrap(), "{xid} commit lost");
        }
        for xid in &acked.aborted {
            assert!(tm.is_abort(*xid).unwrap(), "{xid} abort lost");
        }
        for xid in &acked.begun {
            if !acked.committed.contains(xid) && !acked.aborted.contains(xid) {
                assert!(tm.is_active(*xid).unwrap(), "{xid} should still be active");
            }
        }
    }

    /// True if the crash hit the counter write of a `begin`.
    fn interrupted_begin(ops: &[LedgerOp], crash_point: usize) -> bool {
        let mut start = 0;
        for op in ops {
            let cost = match op {
                LedgerOp::Begin => 2,
                LedgerOp::Commit(_) | LedgerOp::Abort(_) => 1,
            };
            if crash_point < start + cost {
                return *op == LedgerOp::Begin && crash_point == start + 1;
            }
            start += cost;
        }
        false
    }

    #[test]
    fn workload_write_count() {
        // 4 begins x 2 writes + 3 finishes x 1 write
        assert_eq!(count_writes(&workload()), 11);
    }

    #[test]
    fn every_crash_point_recovers_with_rollback_enabled() {
        init_tracing();
        let ops = workload();
        let config = LedgerConfig::default().recover_interrupted_begin(true);

        for point in 0..=count_writes(&ops) {
            let result = crash_and_recover(&ops, point, &config);
            let tm = result
                .recovered
                .unwrap_or_else(|e| panic!("crash at write {point} not recoverable: {e}"));
            assert_acknowledged_survive(&tm, &result.acknowledged);

            // The next begin continues right after the last acknowledged one.
            let expected_next = result.acknowledged.begun.len() as u64 + 1;
            assert_eq!(tm.begin().unwrap(), Xid::new(expected_next));
        }
    }

    #[test]
    fn strict_mode_rejects_only_interrupted_begins() {
        let ops = workload();
        let config = LedgerConfig::default();

        for point in 0..=count_writes(&ops) {
            let result = crash_and_recover(&ops, point, &config);
            if interrupted_begin(&ops, point) {
                assert!(matches!(
                    result.recovered,
                    Err(CoreError::LedgerCorruption { .. })
                ));
            } else {
                let tm = result
                    .recovered
                    .unwrap_or_else(|e| panic!("crash at write {point} rejected: {e}"));
                assert_acknowledged_survive(&tm, &result.acknowledged);
            }
        }
    }

    #[test]
    fn crash_between_begin_writes_leaves_trailing_record() {
        let backend = Arc::new(CrashableBackend::new());
        let tm = TransactionManager::with_backend(
            Box::new(Arc::clone(&backend)),
            &LedgerConfig::default(),
        )
        .unwrap();

        backend.crash_after_writes(1);
        let err = tm.begin().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(backend.durable_image(), crate::ledger_bytes(0, &[0]));

        let strict = TransactionManager::with_backend(
            Box::new(CrashableBackend::with_data(backend.durable_image())),
            &LedgerConfig::default(),
        );
        assert!(matches!(strict, Err(CoreError::LedgerCorruption { .. })));

        let recovered = TransactionManager::with_backend(
            Box::new(CrashableBackend::with_data(backend.durable_image())),
            &LedgerConfig::default().recover_interrupted_begin(true),
        )
        .unwrap();
        assert_eq!(recovered.begin().unwrap(), Xid::new(1));
    }

    #[test]
    fn failed_sync_is_fatal_and_not_acknowledged() {
        let backend = Arc::new(CrashableBackend::new());
        let tm = TransactionManager::with_backend(
            Box::new(Arc::clone(&backend)),
            &LedgerConfig::default(),
        )
        .unwrap();
        let xid = tm.begin().unwrap();

        backend.set_fail_on_sync(true);
        let err = tm.commit(xid).unwrap_err();
        assert!(err.is_fatal());

        let survivor = TransactionManager::with_backend(
            Box::new(CrashableBackend::with_data(backend.durable_image())),
            &LedgerConfig::default(),
        )
        .unwrap();
        assert!(survivor.is_active(xid).unwrap());
    }

    #[test]
    fn super_transaction_never_reads_storage() {
        let backend = Arc::new(CrashableBackend::new());
        let tm = TransactionManager::with_backend(
            Box::new(Arc::clone(&backend)),
            &LedgerConfig::default(),
        )
        .unwrap();
        let xid = tm.begin().unwrap();

        backend.set_fail_reads(true);
        assert!(tm.is_commit(Xid::SUPER).unwrap());
        assert!(!tm.is_active(Xid::SUPER).unwrap());
        assert!(!tm.is_abort(Xid::SUPER).unwrap());
        assert!(tm.is_active(xid).is_err());
    }
}
