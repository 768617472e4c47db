//! Byte-level access to the ledger header and status records.

use crate::error::{CoreError, CoreResult};
use crate::ledger::layout::{
    decode_counter, encode_counter, expected_len, record_offset, HEADER_SIZE, RECORD_SIZE,
};
use crate::transaction::TransactionStatus;
use crate::types::Xid;
use tracing::{error, warn};
use xidledger_storage::StorageBackend;

/// Durable reader/writer for a ledger file.
///
/// Every write is followed by a `sync` of the backend before returning, so
/// an acknowledged write is on stable storage. Reads take no lock beyond
/// what the backend does internally.
pub struct LedgerStore {
    backend: Box<dyn StorageBackend>,
}

impl LedgerStore {
    /// Formats an empty backend as a ledger with a zero counter.
    ///
    /// # Errors
    ///
    /// Fails if the backend is not empty or the header cannot be persisted.
    pub fn initialize(backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let size = backend.size()?;
        if size != 0 {
            return Err(CoreError::ledger_corruption(format!(
                "cannot initialize a ledger over {size} existing bytes"
            )));
        }

        let store = Self { backend };
        store.write_counter(0)?;
        Ok(store)
    }

    /// Opens an existing ledger and checks its length against the header.
    ///
    /// Returns the store together with the validated counter. When
    /// `recover_interrupted_begin` is set, a single trailing `ACTIVE` record
    /// beyond the counter is truncated away first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LedgerCorruption`] if the file is shorter than
    /// the header or its length disagrees with the counter.
    pub fn open_and_validate(
        backend: Box<dyn StorageBackend>,
        recover_interrupted_begin: bool,
    ) -> CoreResult<(Self, u64)> {
        let store = Self { backend };

        let actual = store.backend.size()?;
        if actual < HEADER_SIZE {
            error!(len = actual, "ledger shorter than header");
            return Err(CoreError::ledger_corruption(format!(
                "file is {actual} bytes, shorter than the {HEADER_SIZE}-byte header"
            )));
        }

        let counter = store.read_counter()?;
        let Some(expected) = expected_len(counter) else {
            error!(counter, "ledger counter overflows file length");
            return Err(CoreError::ledger_corruption(format!(
                "counter {counter} overflows the file length"
            )));
        };

        if actual == expected {
            return Ok((store, counter));
        }

        if recover_interrupted_begin && expected.checked_add(RECORD_SIZE) == Some(actual) {
            let byte = store.backend.read_at(expected, RECORD_SIZE as usize)?[0];
            if byte == TransactionStatus::Active.as_byte() {
                warn!(
                    counter,
                    xid = counter + 1,
                    "rolling back interrupted begin"
                );
                store.backend.truncate(expected)?;
                store.backend.sync()?;
                return Ok((store, counter));
            }
        }

        error!(counter, expected, actual, "ledger length mismatch");
        Err(CoreError::ledger_corruption(format!(
            "counter {counter} implies {expected} bytes, file has {actual}"
        )))
    }

    /// Reads the counter from the header.
    pub fn read_counter(&self) -> CoreResult<u64> {
        let bytes = self.backend.read_at(0, HEADER_SIZE as usize)?;
        decode_counter(&bytes)
    }

    /// Writes the counter to the header and syncs.
    pub fn write_counter(&self, counter: u64) -> CoreResult<()> {
        self.backend.write_at(0, &encode_counter(counter))?;
        self.backend.sync()?;
        Ok(())
    }

    /// Reads the stored status of `xid`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SuperTransaction`] for XID 0, which has no
    /// record, [`CoreError::InvalidStatus`] for an unknown status byte and a
    /// storage error if the record lies past the end of the file.
    pub fn read_status(&self, xid: Xid) -> CoreResult<TransactionStatus> {
        let bytes = self
            .backend
            .read_at(Self::offset_of(xid)?, RECORD_SIZE as usize)?;
        let byte = bytes[0];
        TransactionStatus::from_byte(byte).ok_or(CoreError::InvalidStatus { xid, byte })
    }

    /// Writes the status of `xid` and syncs.
    ///
    /// The store does not check transitions; the transaction manager does.
    /// XID 0 is rejected with [`CoreError::SuperTransaction`].
    pub fn write_status(&self, xid: Xid, status: TransactionStatus) -> CoreResult<()> {
        self.backend
            .write_at(Self::offset_of(xid)?, &[status.as_byte()])?;
        self.backend.sync()?;
        Ok(())
    }

    /// Restores the ledger to exactly `counter` allocations.
    ///
    /// Rewrites the header and truncates any record past `counter`, then
    /// syncs. Used to undo a `begin` whose writes did not all persist.
    pub fn rollback_to(&self, counter: u64) -> CoreResult<()> {
        let len = expected_len(counter).ok_or_else(|| {
            CoreError::ledger_corruption(format!("counter {counter} overflows the file length"))
        })?;

        self.backend.write_at(0, &encode_counter(counter))?;
        if self.backend.size()? > len {
            self.backend.truncate(len)?;
        }
        self.backend.sync()?;
        Ok(())
    }

    fn offset_of(xid: Xid) -> CoreResult<u64> {
        record_offset(xid).ok_or(CoreError::SuperTransaction)
    }

    /// Returns the current file length.
    pub fn file_len(&self) -> CoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Forces everything written so far to stable storage.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend.flush()?;
        self.backend.sync()?;
        Ok(())
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore").finish_non_exhaustive()
    }
}
