use async_trait::async_trait;
use dashmap::DashMap;
use embedworks_core::{CacheError, CacheStore};
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

pub type Result<T> = std::result::Result<T, CacheError>;

/// Upper bound on entries kept before the least recently used are evicted.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<[u8]>,
    ttl: Duration,
}

/// Expires every entry after the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// An in-process [`CacheStore`].
///
/// Clones share the same entries and locks. Entries live in a Moka cache
/// that drops them once their TTL has passed, whether or not they are read
/// again. Locks are async mutexes, so a lease is also released if its
/// holder is dropped; the `hold` bound is therefore not enforced.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    entries: Cache<String, Entry>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Lease on an [`InMemoryStore`] lock.
#[derive(Debug)]
pub struct MemoryLease {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();
        Self {
            entries,
            locks: Arc::default(),
        }
    }

    /// Number of live entries, after expired ones have been swept.
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    type Lease = MemoryLease;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!(key = %key, "Reading entry from in-memory store");
        match self.entries.get(key).await {
            Some(entry) => {
                debug!(key = %key, "Hit in in-memory store");
                Ok(Some(entry.value.to_vec()))
            }
            None => {
                trace!(key = %key, "Miss in in-memory store");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidData("ttl must be positive".to_string()));
        }
        self.entries
            .insert(
                key.to_string(),
                Entry {
                    value: Arc::from(value),
                    ttl,
                },
            )
            .await;
        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Stored entry in in-memory store");
        Ok(())
    }

    async fn acquire(&self, key: &str, wait: Duration, _hold: Duration) -> Result<MemoryLease> {
        trace!(key = %key, "Acquiring in-memory lock");
        let mutex = self.locks.entry(key.to_string()).or_default().value().clone();

        match tokio::time::timeout(wait, mutex.lock_owned()).await {
            Ok(guard) => {
                debug!(key = %key, "Acquired in-memory lock");
                Ok(MemoryLease {
                    key: key.to_string(),
                    _guard: guard,
                })
            }
            Err(_) => Err(CacheError::LockTimeout(key.to_string())),
        }
    }

    async fn release(&self, lease: MemoryLease) -> Result<()> {
        let key = lease.key.clone();
        drop(lease);
        // Forget the mutex once nobody holds or waits on it.
        self.locks.remove_if(&key, |_, m| Arc::strong_count(m) == 1);
        debug!(key = %key, "Released in-memory lock");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);
    const HOLD: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn get_and_set() {
        let store = InMemoryStore::new();

        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", b"[1]", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"[1]".to_vec()));
        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let store = InMemoryStore::new();

        store.set("k", b"old", Duration::from_secs(60)).await.unwrap();
        store.set("k", b"new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = InMemoryStore::new();

        store.set("k", b"v", Duration::from_millis(50)).await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_swept_without_being_read() {
        let store = InMemoryStore::new();

        store.set("short", b"v", Duration::from_millis(50)).await.unwrap();
        store.set("long", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.entry_count().await, 2);

        // Moka's expiry timer wheel ticks at roughly one second.
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(store.entry_count().await, 1);
        assert!(store.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overwrite_takes_the_new_ttl() {
        let store = InMemoryStore::new();

        store.set("k", b"old", Duration::from_secs(60)).await.unwrap();
        store.set("k", b"new", Duration::from_millis(50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let store = InMemoryStore::new();

        let err = store.set("k", b"v", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidData(_)));
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();

        store.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn lock_times_out_while_held() {
        let store = InMemoryStore::new();
        let lease = store.acquire("lock", WAIT, HOLD).await.unwrap();

        let err = store
            .acquire("lock", Duration::from_millis(50), HOLD)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::LockTimeout(ref key) if key == "lock"));

        store.release(lease).await.unwrap();
    }

    #[tokio::test]
    async fn distinct_locks_do_not_block_each_other() {
        let store = InMemoryStore::new();
        let a = store.acquire("a", WAIT, HOLD).await.unwrap();
        let b = store
            .acquire("b", Duration::from_millis(50), HOLD)
            .await
            .unwrap();

        store.release(a).await.unwrap();
        store.release(b).await.unwrap();
    }

    #[tokio::test]
    async fn release_hands_lock_to_waiter() {
        let store = InMemoryStore::new();
        let lease = store.acquire("lock", WAIT, HOLD).await.unwrap();

        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.acquire("lock", WAIT, HOLD).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        store.release(lease).await.unwrap();
        let second = waiter.await.unwrap().unwrap();
        store.release(second).await.unwrap();

        assert!(store.locks.is_empty());
    }
}
