//! Reference model for checking a transaction manager.
//!
//! [`LedgerModel`] tracks the status every XID should have. Feeding the same
//! operations to the model and to a [`TransactionManager`] and comparing the
//! outcomes checks allocation order, the one-way status rules and the
//! rejection of unknown XIDs in one pass.

use crate::crash::LedgerOp;
use xidledger_core::{CoreError, TransactionManager, TransactionStatus, Xid};

/// The observable result of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `begin` returned this XID.
    Began(Xid),
    /// `commit`/`abort` succeeded.
    Finished,
    /// The XID was never allocated.
    Unknown,
    /// The XID was already committed or aborted.
    AlreadyTerminal(TransactionStatus),
}

impl Outcome {
    fn from_error(err: &CoreError) -> Self {
        match err {
            CoreError::UnknownXid { .. } => Self::Unknown,
            CoreError::AlreadyTerminal { status, .. } => Self::AlreadyTerminal(*status),
            other => panic!("unexpected ledger error: {other}"),
        }
    }
}

/// Expected ledger contents.
#[derive(Debug, Clone, Default)]
pub struct LedgerModel {
    statuses: Vec<TransactionStatus>,
}

impl LedgerModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highest allocated XID.
    pub fn last_xid(&self) -> Xid {
        Xid::new(self.statuses.len() as u64)
    }

    /// Returns the expected status of `xid`, if allocated.
    pub fn status(&self, xid: Xid) -> Option<TransactionStatus> {
        if xid.is_super() {
            return Some(TransactionStatus::Committed);
        }
        self.statuses.get(xid.as_u64() as usize - 1).copied()
    }

    /// Applies `op` and returns the outcome the manager should report.
    pub fn apply(&mut self, op: LedgerOp) -> Outcome {
        let (raw, next) = match op {
            LedgerOp::Begin => {
                self.statuses.push(TransactionStatus::Active);
                return Outcome::Began(self.last_xid());
            }
            LedgerOp::Commit(raw) => (raw, TransactionStatus::Committed),
            LedgerOp::Abort(raw) => (raw, TransactionStatus::Aborted),
        };

        match self.statuses.get_mut(raw as usize - 1) {
            None => Outcome::Unknown,
            Some(current) if current.is_terminal() => Outcome::AlreadyTerminal(*current),
            Some(current) => {
                *current = next;
                Outcome::Finished
            }
        }
    }
}

/// Runs `op` against a manager and maps the result to an [`Outcome`].
pub fn execute(tm: &TransactionManager, op: LedgerOp) -> Outcome {
    let result = match op {
        LedgerOp::Begin => tm.begin().map(Outcome::Began),
        LedgerOp::Commit(raw) => tm.commit(Xid::new(raw)).map(|()| Outcome::Finished),
        LedgerOp::Abort(raw) => tm.abort(Xid::new(raw)).map(|()| Outcome::Finished),
    };
    result.unwrap_or_else(|err| Outcome::from_error(&err))
}

/// Asserts that every allocated XID has the status the model expects.
pub fn assert_matches_model(tm: &TransactionManager, model: &LedgerModel) {
    assert_eq!(tm.last_xid().expect("manager closed"), model.last_xid());
    for raw in 0..=model.last_xid().as_u64() {
        let xid = Xid::new(raw);
        let expected = model.status(xid).expect("allocated xid missing from model");
        assert_eq!(tm.status(xid).expect("status query failed"), expected, "{xid}");
        assert_eq!(
            tm.is_active(xid).unwrap(),
            expected == TransactionStatus::Active
        );
        assert_eq!(
            tm.is_commit(xid).unwrap(),
            expected == TransactionStatus::Committed
        );
        assert_eq!(
            tm.is_abort(xid).unwrap(),
            expected == TransactionStatus::Aborted
        );
    }
}
