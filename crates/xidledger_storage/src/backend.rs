//! Storage backend trait definition.

use crate::error::StorageResult;
use std::sync::Arc;

/// A low-level positional storage backend.
///
/// Storage backends are **opaque byte stores**. They provide simple operations
/// for reading and writing bytes at a given offset and for forcing those bytes
/// to stable storage. The ledger format is interpreted entirely by the caller.
///
/// # Invariants
///
/// - `read_at` returns exactly the bytes last written at that range
/// - `write_at` at `offset == size()` extends the store; `offset > size()` is
///   rejected so the store never contains unwritten holes
/// - after `sync` returns, every prior `write_at` survives a crash
/// - all methods take `&self`; implementations synchronize internally so a
///   backend can be shared between threads without an outer lock
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` at `offset`, overwriting existing bytes and extending
    /// the store if the write runs past the current end.
    ///
    /// The write is not durable until [`sync`](Self::sync) returns.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `offset` is greater than the current size
    /// - An I/O error occurs
    fn write_at(&self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Flushes buffered writes to the operating system.
    ///
    /// This does not guarantee durability; use [`sync`](Self::sync) for that.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces all data and metadata to durable storage.
    ///
    /// Blocks until the device acknowledges persistence. File length changes
    /// are covered as well as content.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&self) -> StorageResult<()>;

    /// Truncates the storage to the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The truncation fails
    /// - `new_size` is greater than current size
    fn truncate(&self, new_size: u64) -> StorageResult<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> StorageResult<()> {
        (**self).write_at(offset, data)
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }

    fn sync(&self) -> StorageResult<()> {
        (**self).sync()
    }

    fn truncate(&self, new_size: u64) -> StorageResult<()> {
        (**self).truncate(new_size)
    }
}
