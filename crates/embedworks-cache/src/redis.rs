use async_trait::async_trait;
use embedworks_core::{CacheError, CacheStore};
use redis::AsyncCommands;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Pause between attempts to take a contended lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Deletes the lock only if it still carries our token, so a lease that
/// outlived its hold time never frees a successor's lock.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// A Redis-backed [`CacheStore`] shared by every gateway instance.
///
/// Payloads are stored as plain strings with a millisecond expiry. Locks are
/// `SET NX PX` keys holding a random token.
#[derive(Debug, Clone)]
pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
    release_script: redis::Script,
}

/// Lease on a [`RedisStore`] lock.
#[derive(Debug, Clone)]
pub struct RedisLease {
    key: String,
    token: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    let lower = message.to_ascii_lowercase();
    if lower.contains("timed out") {
        CacheError::Timeout(message)
    } else if lower.contains("connection") || lower.contains("broken pipe") {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl RedisStore {
    /// Creates a store on top of an existing multiplexed connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self {
            conn,
            release_script: redis::Script::new(RELEASE_SCRIPT),
        }
    }

    /// Opens a multiplexed connection to `redis_url` and wraps it.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            CacheError::Initialization(format!("invalid redis url '{redis_url}': {e}"))
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    async fn try_lock(&self, key: &str, token: &str, hold: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(millis(hold))
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to take lock in Redis", e))?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    type Lease = RedisLease;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!(key = %key, "Reading entry from Redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "Hit in Redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key = %key, "Miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        trace!(key = %key, "Storing entry in Redis");

        let mut conn = self.conn.clone();
        let result = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query_async::<()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!(key = %key, ttl_ms = millis(ttl), "Stored entry in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to store entry in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn acquire(&self, key: &str, wait: Duration, hold: Duration) -> Result<RedisLease> {
        trace!(key = %key, "Acquiring Redis lock");
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + wait;

        loop {
            if self.try_lock(key, &token, hold).await? {
                debug!(key = %key, "Acquired Redis lock");
                return Ok(RedisLease {
                    key: key.to_string(),
                    token,
                });
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(key = %key, wait_ms = millis(wait), "Gave up waiting for Redis lock");
                return Err(CacheError::LockTimeout(key.to_string()));
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn release(&self, lease: RedisLease) -> Result<()> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .release_script
            .key(&lease.key)
            .arg(&lease.token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to release lock in Redis", e))?;

        if deleted == 0 {
            warn!(key = %lease.key, "Lock expired before it was released");
        } else {
            debug!(key = %lease.key, "Released Redis lock");
        }
        Ok(())
    }
}
