//! Advisory lock giving one manager exclusive ownership of a ledger.
//!
//! The lock lives in a sidecar file next to the ledger:
//!
//! ```text
//! <base>.xid        # ledger
//! <base>.xid.lock   # advisory lock, held while the manager is open
//! ```

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::debug;

/// An exclusive advisory lock on a ledger.
///
/// The lock is released when this value is dropped.
#[derive(Debug)]
pub struct LedgerLock {
    _file: File,
}

impl LedgerLock {
    /// Acquires the lock at `path` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerLocked`] if another holder has it, or an
    /// I/O error if the lock file cannot be opened.
    pub fn acquire(path: &Path) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(CoreError::LedgerLocked);
        }

        debug!(path = %path.display(), "ledger lock acquired");
        Ok(Self { _file: file })
    }
}
