//! Core type definitions for the XID ledger.

use std::fmt;

/// Transaction identifier.
///
/// XIDs are assigned strictly monotonically starting at 1 and never reused.
/// The value 0 is the reserved super transaction, which is always committed
/// and has no stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Xid(pub u64);

impl Xid {
    /// The super transaction.
    pub const SUPER: Xid = Xid(0);

    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the super transaction.
    #[must_use]
    pub const fn is_super(self) -> bool {
        self.0 == 0
    }

    /// Returns the next identifier, or `None` if the XID space is exhausted.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }
}

impl From<u64> for Xid {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xid:{}", self.0)
    }
}
