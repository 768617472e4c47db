//! Error types for the XID ledger core.

use crate::transaction::TransactionStatus;
use crate::types::Xid;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ledger operations.
///
/// The core never terminates the process. Conditions that leave the ledger
/// untrustworthy are reported through [`CoreError::is_fatal`] and the
/// embedding engine decides how to shut down.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] xidledger_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The ledger file does not match its header.
    #[error("ledger corruption: {message}")]
    LedgerCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// A stored status byte is not a known status.
    #[error("invalid status byte {byte:#04x} for {xid}")]
    InvalidStatus {
        /// The transaction whose record was read.
        xid: Xid,
        /// The byte found on disk.
        byte: u8,
    },

    /// The XID has not been allocated.
    #[error("unknown transaction {xid}: highest allocated is {counter}")]
    UnknownXid {
        /// The requested transaction.
        xid: Xid,
        /// The current counter.
        counter: u64,
    },

    /// The super transaction cannot change status.
    #[error("the super transaction is permanently committed")]
    SuperTransaction,

    /// The transaction already reached a terminal status.
    #[error("transaction {xid} is already {status}")]
    AlreadyTerminal {
        /// The transaction.
        xid: Xid,
        /// Its stored terminal status.
        status: TransactionStatus,
    },

    /// Every 64-bit XID has been allocated.
    #[error("transaction identifier space exhausted")]
    XidExhausted,

    /// A failed `begin` could not be rolled back; the live ledger may hold
    /// an allocation that was never acknowledged.
    #[error("ledger poisoned: a failed allocation could not be rolled back")]
    LedgerPoisoned,

    /// The manager has been closed.
    #[error("transaction manager is closed")]
    ManagerClosed,

    /// Another manager holds the ledger lock.
    #[error("ledger locked: another process has exclusive access")]
    LedgerLocked,

    /// The ledger file already exists.
    #[error("ledger already exists: {}", path.display())]
    LedgerExists {
        /// Path of the ledger file.
        path: PathBuf,
    },

    /// The ledger file does not exist.
    #[error("ledger not found: {}", path.display())]
    LedgerNotFound {
        /// Path of the ledger file.
        path: PathBuf,
    },
}

impl CoreError {
    /// Creates a ledger corruption error.
    pub fn ledger_corruption(message: impl Into<String>) -> Self {
        Self::LedgerCorruption {
            message: message.into(),
        }
    }

    /// Returns true if the ledger can no longer be trusted.
    ///
    /// Corruption and any failure on the path to stable storage are fatal.
    /// Contract violations by the caller (unknown XID, double commit, use
    /// after close) are not.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Io(_)
                | Self::LedgerCorruption { .. }
                | Self::InvalidStatus { .. }
                | Self::XidExhausted
                | Self::LedgerPoisoned
        )
    }

    /// Returns true if this error reports on-disk corruption.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::LedgerCorruption { .. } | Self::InvalidStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_is_fatal() {
        let err = CoreError::ledger_corruption("length mismatch");
        assert!(err.is_fatal());
        assert!(err.is_corruption());
        assert_eq!(err.to_string(), "ledger corruption: length mismatch");
    }

    #[test]
    fn io_is_fatal_but_not_corruption() {
        let err = CoreError::from(io::Error::new(io::ErrorKind::Other, "disk gone"));
        assert!(err.is_fatal());
        assert!(!err.is_corruption());
    }

    #[test]
    fn contract_violations_are_not_fatal() {
        let terminal = CoreError::AlreadyTerminal {
            xid: Xid::new(3),
            status: TransactionStatus::Committed,
        };
        assert!(!terminal.is_fatal());
        assert_eq!(terminal.to_string(), "transaction xid:3 is already committed");

        assert!(!CoreError::ManagerClosed.is_fatal());
        assert!(!CoreError::SuperTransaction.is_fatal());
    }

    #[test]
    fn invalid_status_display() {
        let err = CoreError::InvalidStatus {
            xid: Xid::new(7),
            byte: 0x09,
        };
        assert_eq!(err.to_string(), "invalid status byte 0x09 for xid:7");
    }
}
