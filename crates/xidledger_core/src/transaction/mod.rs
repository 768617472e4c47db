//! Transaction identifier allocation and status tracking.
//!
//! Every transaction the engine starts gets an XID from
//! [`TransactionManager::begin`] and ends with exactly one of
//! [`TransactionManager::commit`] or [`TransactionManager::abort`].
//! Visibility checks and recovery ask the manager for the outcome.

mod manager;
mod status;

pub use manager::TransactionManager;
pub use status::TransactionStatus;
