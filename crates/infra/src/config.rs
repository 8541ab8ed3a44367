//! Store-level configuration.

use std::time::Duration;

/// Default bound on how long a writer waits for the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Settings needed to open an inventory store.
///
/// Loading these from the environment is the caller's job; this type only
/// carries the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Postgres connection string. `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Upper bound on waiting for locks (and pool connections) before a
    /// write fails with a storage fault.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn postgres(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            ..Self::default()
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}
