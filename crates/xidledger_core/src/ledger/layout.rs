//! Ledger file layout.

use crate::error::{CoreError, CoreResult};
use crate::types::Xid;
use std::path::{Path, PathBuf};

/// Size of the counter header in bytes.
pub const HEADER_SIZE: u64 = 8;

/// Size of one status record in bytes.
pub const RECORD_SIZE: u64 = 1;

/// File suffix appended to a ledger base path.
pub const LEDGER_SUFFIX: &str = "xid";

/// Returns the byte offset of the status record for `xid`.
///
/// The super transaction has no record, so `Xid::SUPER` yields `None`, as
/// does an XID whose offset overflows.
#[must_use]
pub const fn record_offset(xid: Xid) -> Option<u64> {
    match xid.as_u64().checked_sub(1) {
        Some(index) => match index.checked_mul(RECORD_SIZE) {
            Some(records) => records.checked_add(HEADER_SIZE),
            None => None,
        },
        None => None,
    }
}

/// Returns the file length implied by `counter`, or `None` on overflow.
#[must_use]
pub const fn expected_len(counter: u64) -> Option<u64> {
    match counter.checked_mul(RECORD_SIZE) {
        Some(records) => records.checked_add(HEADER_SIZE),
        None => None,
    }
}

/// Returns the ledger file path for a base path: `<base>.xid`.
#[must_use]
pub fn ledger_path(base: &Path) -> PathBuf {
    with_suffix(base, LEDGER_SUFFIX)
}

/// Returns the advisory lock path for a base path: `<base>.xid.lock`.
#[must_use]
pub fn lock_path(base: &Path) -> PathBuf {
    with_suffix(base, "xid.lock")
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

pub(crate) fn encode_counter(counter: u64) -> [u8; HEADER_SIZE as usize] {
    counter.to_be_bytes()
}

pub(crate) fn decode_counter(bytes: &[u8]) -> CoreResult<u64> {
    let header: [u8; HEADER_SIZE as usize] = bytes.try_into().map_err(|_| {
        CoreError::ledger_corruption(format!(
            "header must be {HEADER_SIZE} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(header))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_follows_header() {
        assert_eq!(record_offset(Xid::new(1)), Some(8));
        assert_eq!(record_offset(Xid::new(10)), Some(17));
    }

    #[test]
    fn super_transaction_has_no_record() {
        assert_eq!(record_offset(Xid::SUPER), None);
        assert_eq!(record_offset(Xid::new(u64::MAX)), None);
    }

    #[test]
    fn expected_len_tracks_counter() {
        assert_eq!(expected_len(0), Some(8));
        assert_eq!(expected_len(3), Some(11));
        assert_eq!(expected_len(u64::MAX), None);
    }

    #[test]
    fn counter_is_big_endian() {
        assert_eq!(encode_counter(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode_counter(&[0, 0, 0, 0, 0, 0, 1, 0]).unwrap(), 256);
    }

    #[test]
    fn short_header_is_corruption() {
        let err = decode_counter(&[0, 1]).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn suffix_is_appended_not_replaced() {
        assert_eq!(
            ledger_path(Path::new("/data/main")),
            PathBuf::from("/data/main.xid")
        );
        assert_eq!(
            ledger_path(Path::new("/data/main.db")),
            PathBuf::from("/data/main.db.xid")
        );
        assert_eq!(
            lock_path(Path::new("/data/main")),
            PathBuf::from("/data/main.xid.lock")
        );
    }
}
