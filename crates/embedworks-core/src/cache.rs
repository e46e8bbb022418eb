use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Key under which the raw upstream payload for `url` is cached.
pub fn data_key(url: &str) -> String {
    format!("ew-data-{url}")
}

/// Key of the fetch lock guarding `url`.
pub fn lock_key(url: &str) -> String {
    format!("ew-lock-{url}")
}

/// A shared key-value store holding raw upstream payloads, plus named
/// exclusive locks used to serialize fetches of the same URL.
///
/// Entries expire on their own; callers never sweep.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Proof of holding a lock. Must be handed back to [`CacheStore::release`].
    type Lease: Send + 'static;

    /// Returns the live value stored under `key`, or `Ok(None)` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Acquires the exclusive lock named `key`.
    ///
    /// Waits at most `wait`; fails with [`CacheError::LockTimeout`] after that.
    /// A held lock is dropped by the store after `hold` even if never released.
    async fn acquire(&self, key: &str, wait: Duration, hold: Duration) -> Result<Self::Lease>;

    /// Releases a lock obtained from [`CacheStore::acquire`].
    async fn release(&self, lease: Self::Lease) -> Result<()>;
}
