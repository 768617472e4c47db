//! Transaction status.

use std::fmt;

/// Status of a transaction as recorded in the ledger.
///
/// The only legal transitions are `Active → Committed` and
/// `Active → Aborted`. Terminal statuses never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Transaction is running.
    Active = 0,
    /// Transaction has been committed.
    Committed = 1,
    /// Transaction has been aborted.
    Aborted = 2,
}

impl TransactionStatus {
    /// Returns the on-disk byte for this status.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decodes an on-disk status byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Active),
            1 => Some(Self::Committed),
            2 => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Returns true for `Committed` and `Aborted`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Returns true if the ledger allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Committed) | (Self::Active, Self::Aborted)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values_are_stable() {
        assert_eq!(TransactionStatus::Active.as_byte(), 0);
        assert_eq!(TransactionStatus::Committed.as_byte(), 1);
        assert_eq!(TransactionStatus::Aborted.as_byte(), 2);
    }

    #[test]
    fn unknown_bytes_rejected() {
        assert_eq!(TransactionStatus::from_byte(3), None);
        assert_eq!(TransactionStatus::from_byte(0xff), None);
    }

    #[test]
    fn only_active_may_transition() {
        use TransactionStatus::*;

        assert!(Active.can_transition_to(Committed));
        assert!(Active.can_transition_to(Aborted));
        assert!(!Active.can_transition_to(Active));
        assert!(!Committed.can_transition_to(Aborted));
        assert!(!Committed.can_transition_to(Committed));
        assert!(!Aborted.can_transition_to(Committed));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TransactionStatus::Active.is_terminal());
        assert!(TransactionStatus::Committed.is_terminal());
        assert!(TransactionStatus::Aborted.is_terminal());
    }
}
