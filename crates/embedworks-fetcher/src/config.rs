use std::time::Duration;
use tracing::warn;
use typed_builder::TypedBuilder;

/// How long extraction results stay cached unless configured otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
/// How long a request waits for another request's fetch of the same URL.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(30);
/// Default bound on a single extraction call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);
/// Part of the lock hold kept back for decoding and the cache write.
pub const DEFAULT_WRITE_MARGIN: Duration = Duration::from_secs(5);
/// How long a fetch lock survives if its holder never releases it.
pub const DEFAULT_LOCK_HOLD: Duration = lock_hold_for(DEFAULT_UPSTREAM_TIMEOUT);

/// The lock hold that lets an extraction of up to `upstream_timeout` finish
/// and be cached before the lock lapses.
pub const fn lock_hold_for(upstream_timeout: Duration) -> Duration {
    upstream_timeout.saturating_add(DEFAULT_WRITE_MARGIN)
}

/// Tuning of a [`CachedFetcher`](crate::CachedFetcher).
#[derive(Debug, Clone, TypedBuilder)]
pub struct FetcherConfig {
    /// Lifetime of a cached payload.
    #[builder(default = DEFAULT_TTL)]
    pub ttl: Duration,
    /// Upper bound on waiting for the per-URL lock.
    #[builder(default = DEFAULT_LOCK_WAIT)]
    pub lock_wait: Duration,
    /// Upper bound on holding the per-URL lock.
    #[builder(default = DEFAULT_LOCK_HOLD)]
    pub lock_hold: Duration,
    /// Part of `lock_hold` that the extraction call may not use.
    #[builder(default = DEFAULT_WRITE_MARGIN)]
    pub write_margin: Duration,
}

impl FetcherConfig {
    /// Longest an extraction call may run while the lock is held.
    ///
    /// A store may hand the lock to another caller once `lock_hold` has
    /// passed, so the call is cut off early enough to cache its payload
    /// before that.
    pub fn extract_budget(&self) -> Duration {
        self.lock_hold.saturating_sub(self.write_margin)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Parses a cache TTL given in whole seconds.
///
/// Missing, unparseable and zero values fall back to [`DEFAULT_TTL`].
pub fn parse_ttl(value: Option<&str>) -> Duration {
    let Some(raw) = value else {
        return DEFAULT_TTL;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            warn!(value = %raw, default_secs = DEFAULT_TTL.as_secs(), "Invalid cache ttl, using default");
            DEFAULT_TTL
        }
    }
}
