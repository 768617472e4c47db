//! Ledger configuration.

/// Configuration for opening a ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Whether to create the ledger if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the ledger already exists.
    pub error_if_exists: bool,

    /// Whether to hold an advisory exclusive lock on the ledger while open.
    pub lock_file: bool,

    /// Whether to roll back a `begin` that crashed between its two writes.
    ///
    /// Such a crash leaves exactly one `ACTIVE` record past the stored
    /// counter. When enabled, that record is truncated away at open. Any
    /// other length mismatch is still reported as corruption.
    pub recover_interrupted_begin: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            lock_file: true,
            recover_interrupted_begin: false,
        }
    }
}

impl LedgerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the ledger if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the ledger exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether to take the advisory ledger lock.
    #[must_use]
    pub const fn lock_file(mut self, value: bool) -> Self {
        self.lock_file = value;
        self
    }

    /// Sets whether to roll back an interrupted `begin` at open.
    #[must_use]
    pub const fn recover_interrupted_begin(mut self, value: bool) -> Self {
        self.recover_interrupted_begin = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LedgerConfig::default();
        assert!(config.create_if_missing);
        assert!(!config.error_if_exists);
        assert!(config.lock_file);
        assert!(!config.recover_interrupted_begin);
    }

    #[test]
    fn builder_pattern() {
        let config = LedgerConfig::new()
            .create_if_missing(false)
            .error_if_exists(true)
            .lock_file(false)
            .recover_interrupted_begin(true);

        assert!(!config.create_if_missing);
        assert!(config.error_if_exists);
        assert!(!config.lock_file);
        assert!(config.recover_interrupted_begin);
    }
}
