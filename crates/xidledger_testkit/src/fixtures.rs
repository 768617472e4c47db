//! Test fixtures and ledger helpers.
//!
//! Provides convenience functions for setting up test ledgers and common
//! test scenarios.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use xidledger_core::{ledger, LedgerConfig, TransactionManager, Xid};
use xidledger_storage::InMemoryBackend;

/// A test ledger with automatic cleanup.
pub struct TestLedger {
    /// The transaction manager.
    pub tm: TransactionManager,
    /// Base path for file-backed ledgers.
    base: Option<PathBuf>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestLedger {
    /// Creates a new in-memory test ledger.
    pub fn memory() -> Self {
        let tm = TransactionManager::with_backend(
            Box::new(InMemoryBackend::new()),
            &LedgerConfig::default(),
        )
        .expect("Failed to open in-memory ledger");

        Self {
            tm,
            base: None,
            _temp_dir: None,
        }
    }

    /// Creates a new in-memory ledger and returns the shared backend.
    ///
    /// The backend handle lets tests inspect raw bytes and sync counts.
    pub fn memory_shared() -> (Self, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let tm = TransactionManager::with_backend(
            Box::new(Arc::clone(&backend)),
            &LedgerConfig::default(),
        )
        .expect("Failed to open in-memory ledger");

        (
            Self {
                tm,
                base: None,
                _temp_dir: None,
            },
            backend,
        )
    }

    /// Creates a new file-based test ledger in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(&LedgerConfig::default())
    }

    /// Creates a new file-based test ledger with the given config.
    pub fn file_with_config(config: &LedgerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path().join("ledger");
        let tm = TransactionManager::create(&base, config).expect("Failed to create ledger");

        Self {
            tm,
            base: Some(base),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the base path if file-based, None if in-memory.
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Returns the ledger file path if file-based.
    pub fn ledger_file(&self) -> Option<PathBuf> {
        self.base.as_deref().map(ledger::ledger_path)
    }

    /// Closes the current manager and opens the same ledger again.
    ///
    /// # Panics
    ///
    /// Panics for in-memory ledgers or if reopening fails.
    pub fn reopen(&mut self) {
        self.reopen_with_config(&LedgerConfig::default());
    }

    /// Closes the current manager and reopens with `config`.
    pub fn reopen_with_config(&mut self, config: &LedgerConfig) {
        let base = self
            .base
            .clone()
            .expect("Only file-based ledgers can be reopened");
        self.tm.close().expect("Failed to close ledger");
        self.tm = TransactionManager::open(&base, config).expect("Failed to reopen ledger");
    }
}

impl std::ops::Deref for TestLedger {
    type Target = TransactionManager;

    fn deref(&self) -> &Self::Target {
        &self.tm
    }
}

/// Runs a test with a temporary in-memory ledger.
pub fn with_memory_ledger<F, R>(f: F) -> R
where
    F: FnOnce(&TransactionManager) -> R,
{
    let ledger = TestLedger::memory();
    f(&ledger.tm)
}

/// Runs a test with a temporary file-based ledger.
pub fn with_file_ledger<F, R>(f: F) -> R
where
    F: FnOnce(&TransactionManager, &Path) -> R,
{
    let ledger = TestLedger::file();
    let base = ledger
        .base()
        .expect("File ledger should have a base path")
        .to_path_buf();
    f(&ledger.tm, &base)
}

/// Builds raw ledger bytes: big-endian counter followed by status bytes.
pub fn ledger_bytes(counter: u64, statuses: &[u8]) -> Vec<u8> {
    let mut data = counter.to_be_bytes().to_vec();
    data.extend_from_slice(statuses);
    data
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Begins `count` transactions, committing even XIDs and aborting every
    /// third one that is not even. The rest stay active.
    pub fn mixed_ledger(tm: &TransactionManager, count: u64) -> Vec<Xid> {
        (0..count)
            .map(|_| {
                let xid = tm.begin().expect("Failed to begin");
                let raw = xid.as_u64();
                if raw % 2 == 0 {
                    tm.commit(xid).expect("Failed to commit");
                } else if raw % 3 == 0 {
                    tm.abort(xid).expect("Failed to abort");
                }
                xid
            })
            .collect()
    }
}
