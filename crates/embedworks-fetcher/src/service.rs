use std::sync::Arc;

use async_trait::async_trait;
use embedworks_core::{
    data_key, decode_results, lock_key, CacheStore, Error, ExtractionResult, Result,
};
use tracing::{debug, info, trace, warn};

use crate::{Extractor, FetcherConfig};

/// Source of extraction results for canonical URLs.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Returns the extraction results for the canonical URL `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<ExtractionResult>>;
}

/// Cache-aside retrieval of extraction results with one fetch per URL at a time.
///
/// Every call takes the URL's lock in the store before reading the cache,
/// and keeps it until the payload is cached or the call has failed. A
/// second caller for the same URL therefore waits for the first and then
/// finds the payload in the cache.
///
/// The locked section runs on its own task. A caller that goes away, such
/// as a dropped request, does not interrupt it: the fetch still completes,
/// its payload is cached and the lock is released.
#[derive(Debug)]
pub struct CachedFetcher<S, X> {
    store: Arc<S>,
    extractor: Arc<X>,
    config: FetcherConfig,
}

impl<S, X> Clone for CachedFetcher<S, X> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            extractor: Arc::clone(&self.extractor),
            config: self.config.clone(),
        }
    }
}

impl<S: CacheStore, X: Extractor> CachedFetcher<S, X> {
    pub fn new(store: S, extractor: X, config: FetcherConfig) -> Self {
        Self {
            store: Arc::new(store),
            extractor: Arc::new(extractor),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Returns the extraction results for the canonical URL `url`.
    ///
    /// # Errors
    ///
    /// * `LockTimeout` - another fetch of `url` held the lock for too long
    /// * `UpstreamUnavailable` - the extraction service could not be reached
    /// * `InvalidUpstreamResponse` - the payload held no recognized result
    /// * `Cache` - the store failed
    pub async fn fetch(&self, url: &str) -> Result<Vec<ExtractionResult>> {
        Fetcher::fetch(self, url).await
    }

    async fn fetch_locked(&self, url: &str) -> Result<Vec<ExtractionResult>> {
        let key = data_key(url);

        if let Some(raw) = self.store.get(&key).await? {
            debug!(url = %url, "Extraction results served from cache");
            return decode_results(&raw);
        }

        let budget = self.config.extract_budget();
        info!(url = %url, budget_ms = budget.as_millis() as u64, "Cache miss, calling extraction service");
        let raw = tokio::time::timeout(budget, self.extractor.extract(url))
            .await
            .map_err(|_| {
                warn!(url = %url, "Extraction call outlived the fetch lock budget");
                Error::UpstreamUnavailable(format!(
                    "extraction did not finish within {}ms",
                    budget.as_millis()
                ))
            })??;
        // Payloads without a usable result are not cached.
        let results = decode_results(&raw)?;

        if let Err(e) = self.store.set(&key, &raw, self.config.ttl).await {
            warn!(url = %url, error = %e, "Failed to cache extraction results");
        } else {
            debug!(url = %url, results = results.len(), "Cached extraction results");
        }
        Ok(results)
    }

    async fn fetch_exclusive(&self, url: &str) -> Result<Vec<ExtractionResult>> {
        let lock = lock_key(url);
        trace!(url = %url, "Waiting for fetch lock");
        let lease = self
            .store
            .acquire(&lock, self.config.lock_wait, self.config.lock_hold)
            .await?;

        let outcome = self.fetch_locked(url).await;

        if let Err(e) = self.store.release(lease).await {
            // The lock still lapses on its own after `lock_hold`.
            warn!(url = %url, error = %e, "Failed to release fetch lock");
        }
        outcome
    }
}

#[async_trait]
impl<S: CacheStore, X: Extractor> Fetcher for CachedFetcher<S, X> {
    async fn fetch(&self, url: &str) -> Result<Vec<ExtractionResult>> {
        let this = self.clone();
        let owned_url = url.to_string();
        let task = tokio::spawn(async move { this.fetch_exclusive(&owned_url).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch task was cancelled");
                Err(Error::UpstreamUnavailable(format!("fetch task cancelled: {e}")))
            }
        }
    }
}
