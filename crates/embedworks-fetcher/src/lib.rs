//! Cached retrieval of extraction results.
//!
//! [`CachedFetcher`] resolves a canonical URL to its decoded
//! [`ExtractionResult`](embedworks_core::ExtractionResult)s. It consults a
//! shared [`CacheStore`](embedworks_core::CacheStore) first and calls the
//! [`Extractor`] only on a miss, holding a per-URL lock throughout so that
//! concurrent requests for the same URL cause at most one upstream call.
//!
//! # Example
//!
//! ```rust,no_run
//! use embedworks_cache::RedisStore;
//! use embedworks_fetcher::{CachedFetcher, FetcherConfig, UfysClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisStore::connect("redis://127.0.0.1:6379").await?;
//! let ufys = UfysClient::new("http://ufys:8000", Duration::from_secs(60))?;
//! let fetcher = CachedFetcher::new(store, ufys, FetcherConfig::default());
//!
//! for result in fetcher.fetch("https://www.tiktok.com/@a/video/1").await? {
//!     println!("{result:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extractor;
pub mod service;
pub mod ufys;

pub use config::{lock_hold_for, parse_ttl, FetcherConfig, DEFAULT_TTL, DEFAULT_UPSTREAM_TIMEOUT};
pub use extractor::Extractor;
pub use service::{CachedFetcher, Fetcher};
pub use ufys::UfysClient;
