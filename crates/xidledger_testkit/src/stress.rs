//! Stress tests for the XID ledger.
//!
//! These runners drive a shared [`TransactionManager`] from many threads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use xidledger_core::{TransactionManager, TransactionStatus, Xid};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Transactions each thread runs.
    pub transactions_per_thread: usize,
    /// Every n-th XID is aborted instead of committed (0 = never abort).
    pub abort_every: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            transactions_per_thread: 250,
            abort_every: 3,
        }
    }
}

impl StressConfig {
    /// Total transactions across all threads.
    pub fn total_transactions(&self) -> usize {
        self.threads * self.transactions_per_thread
    }

    /// The terminal status the lifecycle runner assigns to `xid`.
    pub fn outcome_for(&self, xid: Xid) -> TransactionStatus {
        if self.abort_every != 0 && xid.as_u64() % self.abort_every == 0 {
            TransactionStatus::Aborted
        } else {
            TransactionStatus::Committed
        }
    }
}

/// Calls `begin` concurrently and returns every XID handed out.
pub fn stress_concurrent_begin(
    tm: &Arc<TransactionManager>,
    config: &StressConfig,
) -> (StressTestResult, Vec<Xid>) {
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let tm = Arc::clone(tm);
            let failed = Arc::clone(&failed);
            let count = config.transactions_per_thread;
            thread::spawn(move || {
                let mut xids = Vec::with_capacity(count);
                for _ in 0..count {
                    match tm.begin() {
                        Ok(xid) => xids.push(xid),
                        Err(_) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
                xids
            })
        })
        .collect();

    let mut all = Vec::with_capacity(config.total_transactions());
    for handle in handles {
        all.extend(handle.join().expect("stress thread panicked"));
    }

    let result = StressTestResult::new(all.len(), failed.load(Ordering::SeqCst), start.elapsed());
    (result, all)
}

/// Runs full begin → commit/abort lifecycles concurrently.
///
/// Returns the terminal status each thread recorded for its XIDs.
pub fn stress_concurrent_lifecycle(
    tm: &Arc<TransactionManager>,
    config: &StressConfig,
) -> (StressTestResult, HashMap<Xid, TransactionStatus>) {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let tm = Arc::clone(tm);
            let config = config.clone();
            thread::spawn(move || {
                let mut outcomes = Vec::with_capacity(config.transactions_per_thread);
                let mut failed = 0usize;
                for _ in 0..config.transactions_per_thread {
                    let Ok(xid) = tm.begin() else {
                        failed += 1;
                        continue;
                    };
                    let outcome = config.outcome_for(xid);
                    let result = match outcome {
                        TransactionStatus::Aborted => tm.abort(xid),
                        _ => tm.commit(xid),
                    };
                    match result {
                        Ok(()) => outcomes.push((xid, outcome)),
                        Err(_) => failed += 1,
                    }
                }
                (outcomes, failed)
            })
        })
        .collect();

    let mut outcomes = HashMap::with_capacity(config.total_transactions());
    let mut failed = 0;
    for handle in handles {
        let (thread_outcomes, thread_failed) = handle.join().expect("stress thread panicked");
        outcomes.extend(thread_outcomes);
        failed += thread_failed;
    }

    let result = StressTestResult::new(outcomes.len() * 2, failed, start.elapsed());
    (result, outcomes)
}

/// Queries statuses from reader threads while writers run lifecycles.
///
/// Readers only ask about XIDs that `last_xid` has already published, so
/// every query must succeed. Returns the number of failed queries.
pub fn stress_readers_during_writes(
    tm: &Arc<TransactionManager>,
    config: &StressConfig,
    readers: usize,
) -> StressTestResult {
    let done = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let reader_handles: Vec<_> = (0..readers)
        .map(|seed| {
            let tm = Arc::clone(tm);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut ok = 0usize;
                let mut failed = 0usize;
                let mut probe = seed as u64;
                while !done.load(Ordering::SeqCst) {
                    let last = tm.last_xid().map(Xid::as_u64).unwrap_or(0);
                    if last == 0 {
                        thread::yield_now();
                        continue;
                    }
                    probe = probe.wrapping_mul(6364136223846793005).wrapping_add(1);
                    let xid = Xid::new(probe % last + 1);
                    match tm.status(xid) {
                        Ok(_) => ok += 1,
                        Err(_) => failed += 1,
                    }
                }
                (ok, failed)
            })
        })
        .collect();

    let (writes, _) = stress_concurrent_lifecycle(tm, config);
    done.store(true, Ordering::SeqCst);

    let mut successful = writes.successful_ops;
    let mut failed = writes.failed_ops;
    for handle in reader_handles {
        let (ok, bad) = handle.join().expect("reader thread panicked");
        successful += ok;
        failed += bad;
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestLedger;
    use std::collections::HashSet;

    fn small_config() -> StressConfig {
        StressConfig {
            threads: 4,
            transactions_per_thread: 50,
            abort_every: 3,
        }
    }

    #[test]
    fn concurrent_begin_yields_exact_range() {
        let tm = Arc::new(TestLedger::memory().tm);
        let config = small_config();

        let (result, xids) = stress_concurrent_begin(&tm, &config);
        assert_eq!(result.failed_ops, 0);

        let total = config.total_transactions() as u64;
        let unique: HashSet<_> = xids.iter().map(|x| x.as_u64()).collect();
        assert_eq!(unique.len(), xids.len());
        assert_eq!(unique, (1..=total).collect::<HashSet<_>>());
    }

    #[test]
    fn concurrent_begin_on_file_ledger() {
        let ledger = TestLedger::file();
        let base = ledger.base().unwrap().to_path_buf();
        let tm = Arc::new(ledger.tm);
        let config = StressConfig {
            threads: 4,
            transactions_per_thread: 10,
            abort_every: 0,
        };

        let (_, xids) = stress_concurrent_begin(&tm, &config);
        assert_eq!(xids.len(), 40);
        tm.close().unwrap();

        let reopened =
            TransactionManager::open(&base, &xidledger_core::LedgerConfig::default()).unwrap();
        assert_eq!(reopened.last_xid().unwrap(), Xid::new(40));
        assert_eq!(reopened.begin().unwrap(), Xid::new(41));
    }

    #[test]
    fn lifecycle_statuses_match_ledger() {
        let tm = Arc::new(TestLedger::memory().tm);
        let config = small_config();

        let (result, outcomes) = stress_concurrent_lifecycle(&tm, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(outcomes.len(), config.total_transactions());

        for (xid, expected) in &outcomes {
            assert_eq!(tm.status(*xid).unwrap(), *expected);
            assert_eq!(*expected, config.outcome_for(*xid));
        }
    }

    #[test]
    fn readers_never_fail_on_published_xids() {
        let tm = Arc::new(TestLedger::memory().tm);
        let result = stress_readers_during_writes(&tm, &small_config(), 3);
        assert_eq!(result.failed_ops, 0);
    }
}
