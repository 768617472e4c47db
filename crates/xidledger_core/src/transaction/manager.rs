//! Transaction manager.

use crate::config::LedgerConfig;
use crate::error::{CoreError, CoreResult};
use crate::ledger::{ledger_path, lock_path, LedgerStore};
use crate::lock::LedgerLock;
use crate::transaction::status::TransactionStatus;
use crate::types::Xid;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, error, info, warn};
use xidledger_storage::{FileBackend, StorageBackend};

/// Resources released by [`TransactionManager::close`].
struct OpenLedger {
    store: LedgerStore,
    _lock: Option<LedgerLock>,
}

/// Allocates XIDs and records their status durably.
///
/// The transaction manager provides:
/// - Gap-free, strictly increasing XID allocation via `begin()`
/// - One-way status transitions via `commit()` / `abort()`
/// - Status queries for the rest of the engine
///
/// Every mutation is synced to stable storage before the call returns.
///
/// ## Locking
///
/// A single mutex guards the allocated counter and is held by every
/// mutating call (`begin`, `commit`, `abort`). This makes allocation
/// linearizable and lets `commit`/`abort` check the stored status before
/// overwriting it, so a terminal status is never replaced even if two
/// callers race on the same XID. Queries do not take this mutex; they
/// bound-check against a counter published after each durable allocation.
///
/// ## Failed Allocation
///
/// If `begin` fails part way, its writes are rolled back before the error is
/// returned. If the rollback fails too, the manager is poisoned: mutations
/// return [`CoreError::LedgerPoisoned`] and `close` releases the ledger
/// without a final sync.
///
/// ## Closing
///
/// After [`close`](Self::close) every operation returns
/// [`CoreError::ManagerClosed`], including queries for the super transaction.
pub struct TransactionManager {
    /// Open ledger; `None` once closed.
    ledger: RwLock<Option<OpenLedger>>,
    /// Highest allocated XID. Held across every mutation.
    counter: Mutex<u64>,
    /// `counter` as last persisted, readable without the mutex.
    published: AtomicU64,
    /// Set when a failed `begin` could not be rolled back.
    poisoned: AtomicBool,
    /// Ledger file path, when file-backed.
    path: Option<PathBuf>,
}

impl TransactionManager {
    /// Creates a new ledger at `<base>.xid`.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerExists`] if the file already exists,
    /// [`CoreError::LedgerLocked`] if another manager holds the lock, or an
    /// I/O error.
    pub fn create(base: &Path, config: &LedgerConfig) -> CoreResult<Self> {
        let path = ledger_path(base);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let lock = Self::acquire_lock(base, config)?;
        let backend = FileBackend::create_new(&path).map_err(|err| {
            if err.io_kind() == Some(std::io::ErrorKind::AlreadyExists) {
                CoreError::LedgerExists { path: path.clone() }
            } else {
                err.into()
            }
        })?;
        let store = Self::initialize_new(&path, Box::new(backend))?;

        info!(path = %path.display(), "ledger created");
        Ok(Self::from_parts(store, 0, lock, Some(path)))
    }

    /// Opens the ledger at `<base>.xid`, validating it against its header.
    ///
    /// A missing ledger is created when `config.create_if_missing` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerCorruption`] if validation fails,
    /// [`CoreError::LedgerNotFound`] / [`CoreError::LedgerExists`] per the
    /// config, [`CoreError::LedgerLocked`], or an I/O error.
    pub fn open(base: &Path, config: &LedgerConfig) -> CoreResult<Self> {
        let path = ledger_path(base);

        if !path.exists() {
            if !config.create_if_missing {
                return Err(CoreError::LedgerNotFound { path });
            }
            return Self::create(base, config);
        }

        if config.error_if_exists {
            return Err(CoreError::LedgerExists { path });
        }

        let lock = Self::acquire_lock(base, config)?;
        let backend = FileBackend::open_existing(&path)?;
        let (store, counter) =
            LedgerStore::open_and_validate(Box::new(backend), config.recover_interrupted_begin)?;

        info!(path = %path.display(), counter, "ledger opened");
        Ok(Self::from_parts(store, counter, lock, Some(path)))
    }

    /// Builds a manager over an arbitrary backend.
    ///
    /// An empty backend is formatted as a new ledger; anything else is
    /// validated like a file opened with [`open`](Self::open). No advisory
    /// lock is taken.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerCorruption`] if validation fails, or a
    /// storage error.
    pub fn with_backend(
        backend: Box<dyn StorageBackend>,
        config: &LedgerConfig,
    ) -> CoreResult<Self> {
        let (store, counter) = if backend.size()? == 0 {
            (LedgerStore::initialize(backend)?, 0)
        } else {
            LedgerStore::open_and_validate(backend, config.recover_interrupted_begin)?
        };

        debug!(counter, "ledger attached to backend");
        Ok(Self::from_parts(store, counter, None, None))
    }

    /// Formats a freshly created ledger file, removing it if that fails so
    /// a later `open` can create it again.
    fn initialize_new(path: &Path, backend: Box<dyn StorageBackend>) -> CoreResult<LedgerStore> {
        LedgerStore::initialize(backend).map_err(|err| {
            if let Err(remove) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %remove, "failed to remove partial ledger");
            }
            err
        })
    }

    fn from_parts(
        store: LedgerStore,
        counter: u64,
        lock: Option<LedgerLock>,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            ledger: RwLock::new(Some(OpenLedger { store, _lock: lock })),
            counter: Mutex::new(counter),
            published: AtomicU64::new(counter),
            poisoned: AtomicBool::new(false),
            path,
        }
    }

    fn acquire_lock(base: &Path, config: &LedgerConfig) -> CoreResult<Option<LedgerLock>> {
        if config.lock_file {
            Ok(Some(LedgerLock::acquire(&lock_path(base))?))
        } else {
            Ok(None)
        }
    }

    /// Starts a new transaction and returns its XID.
    ///
    /// The `ACTIVE` record is persisted before the counter that covers it,
    /// so a crash in between leaves the counter untouched and the next
    /// `begin` after restart hands out the same XID again. A failure in
    /// either write is rolled back before the error is returned.
    pub fn begin(&self) -> CoreResult<Xid> {
        let mut counter = self.counter.lock();
        let guard = self.ledger.read();
        let ledger = guard.as_ref().ok_or(CoreError::ManagerClosed)?;
        self.ensure_healthy()?;

        let xid = Xid::new(*counter)
            .checked_next()
            .ok_or(CoreError::XidExhausted)?;

        let written = ledger
            .store
            .write_status(xid, TransactionStatus::Active)
            .and_then(|()| ledger.store.write_counter(xid.as_u64()));
        if let Err(err) = written {
            self.undo_begin(&ledger.store, *counter, xid);
            return Err(err);
        }

        *counter = xid.as_u64();
        self.published.store(xid.as_u64(), Ordering::Release);

        debug!(%xid, "transaction started");
        Ok(xid)
    }

    fn undo_begin(&self, store: &LedgerStore, counter: u64, xid: Xid) {
        match store.rollback_to(counter) {
            Ok(()) => warn!(%xid, "rolled back failed begin"),
            Err(err) => {
                error!(%xid, error = %err, "rollback of failed begin failed; ledger poisoned");
                self.poisoned.store(true, Ordering::Release);
            }
        }
    }

    fn ensure_healthy(&self) -> CoreResult<()> {
        if self.poisoned.load(Ordering::Acquire) {
            return Err(CoreError::LedgerPoisoned);
        }
        Ok(())
    }

    /// Marks an active transaction as committed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyTerminal`] if the transaction already
    /// committed or aborted, [`CoreError::UnknownXid`] if it was never
    /// allocated, and [`CoreError::SuperTransaction`] for XID 0.
    pub fn commit(&self, xid: Xid) -> CoreResult<()> {
        self.finish(xid, TransactionStatus::Committed)
    }

    /// Marks an active transaction as aborted.
    ///
    /// # Errors
    ///
    /// Same as [`commit`](Self::commit).
    pub fn abort(&self, xid: Xid) -> CoreResult<()> {
        self.finish(xid, TransactionStatus::Aborted)
    }

    fn finish(&self, xid: Xid, status: TransactionStatus) -> CoreResult<()> {
        let counter = self.counter.lock();
        let guard = self.ledger.read();
        let ledger = guard.as_ref().ok_or(CoreError::ManagerClosed)?;
        self.ensure_healthy()?;

        if xid.is_super() {
            return Err(CoreError::SuperTransaction);
        }
        if xid.as_u64() > *counter {
            return Err(CoreError::UnknownXid {
                xid,
                counter: *counter,
            });
        }

        let current = ledger.store.read_status(xid)?;
        if !current.can_transition_to(status) {
            warn!(%xid, %current, requested = %status, "rejected status change");
            return Err(CoreError::AlreadyTerminal {
                xid,
                status: current,
            });
        }

        ledger.store.write_status(xid, status)?;
        debug!(%xid, %status, "transaction finished");
        Ok(())
    }

    /// Returns the stored status of `xid`.
    ///
    /// The super transaction is reported as committed without touching
    /// storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownXid`] if `xid` has not been allocated.
    pub fn status(&self, xid: Xid) -> CoreResult<TransactionStatus> {
        let guard = self.ledger.read();
        let ledger = guard.as_ref().ok_or(CoreError::ManagerClosed)?;

        if xid.is_super() {
            return Ok(TransactionStatus::Committed);
        }

        let counter = self.published.load(Ordering::Acquire);
        if xid.as_u64() > counter {
            return Err(CoreError::UnknownXid { xid, counter });
        }

        ledger.store.read_status(xid)
    }

    /// Returns true if `xid` is still running.
    pub fn is_active(&self, xid: Xid) -> CoreResult<bool> {
        Ok(self.status(xid)? == TransactionStatus::Active)
    }

    /// Returns true if `xid` committed. Always true for the super transaction.
    pub fn is_commit(&self, xid: Xid) -> CoreResult<bool> {
        Ok(self.status(xid)? == TransactionStatus::Committed)
    }

    /// Returns true if `xid` aborted.
    pub fn is_abort(&self, xid: Xid) -> CoreResult<bool> {
        Ok(self.status(xid)? == TransactionStatus::Aborted)
    }

    /// Returns the highest XID allocated so far.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ManagerClosed`] after `close()`.
    pub fn last_xid(&self) -> CoreResult<Xid> {
        if self.ledger.read().is_none() {
            return Err(CoreError::ManagerClosed);
        }
        Ok(Xid::new(self.published.load(Ordering::Acquire)))
    }

    /// Returns the ledger file path, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Checks if the manager is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ledger.read().is_some()
    }

    /// Syncs the ledger and releases the file and its lock.
    ///
    /// Waits for in-flight operations. Closing twice is a no-op. A poisoned
    /// manager is released without the final sync.
    ///
    /// # Errors
    ///
    /// Returns an error if the final sync fails; the manager stays open.
    pub fn close(&self) -> CoreResult<()> {
        let mut guard = self.ledger.write();
        let Some(ledger) = guard.as_ref() else {
            return Ok(());
        };

        if self.poisoned.load(Ordering::Acquire) {
            warn!("closing poisoned ledger without sync");
        } else {
            ledger.store.sync()?;
        }
        *guard = None;

        info!(
            last_xid = self.published.load(Ordering::Acquire),
            "ledger closed"
        );
        Ok(())
    }
}

impl fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionManager")
            .field("path", &self.path)
            .field("is_open", &self.is_open())
            .field("poisoned", &self.poisoned.load(Ordering::Acquire))
            .field("last_xid", &self.published.load(Ordering::Acquire))
            .finish()
    }
}
