//! Two fetchers sharing one Redis behave like two gateway instances.
//! Run with `cargo test -- --ignored`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use embedworks_cache::RedisStore;
use embedworks_core::Result;
use embedworks_fetcher::{CachedFetcher, Extractor, FetcherConfig};
use embedworks_test_infra::redis::RedisServer;

const URL: &str = "https://www.youtube.com/watch?v=abc";

#[derive(Clone, Default)]
struct SlowExtractor {
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

struct Running(Arc<AtomicUsize>);

impl Drop for Running {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Extractor for SlowExtractor {
    async fn extract(&self, _url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _running = Running(Arc::clone(&self.in_flight));
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(br#"[{"_class":"UfysResponse","site":"YouTube","video_url":"https://cdn.example/abc.mp4"}]"#.to_vec())
    }
}

async fn instance(
    server: &RedisServer,
    extractor: SlowExtractor,
    config: FetcherConfig,
) -> CachedFetcher<RedisStore, SlowExtractor> {
    let store = RedisStore::connect(&server.url().await.expect("Failed to get Redis url"))
        .await
        .expect("Failed to connect to Redis");
    CachedFetcher::new(store, extractor, config)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_instances_share_one_upstream_call() {
    let server = RedisServer::start().await.expect("Failed to start Redis");
    let extractor = SlowExtractor::default();
    let a = instance(&server, extractor.clone(), FetcherConfig::default()).await;
    let b = instance(&server, extractor.clone(), FetcherConfig::default()).await;

    let (ra, rb) = tokio::join!(a.fetch(URL), b.fetch(URL));

    assert_eq!(ra.unwrap(), rb.unwrap());
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_expired_payload_is_fetched_again() {
    let server = RedisServer::start().await.expect("Failed to start Redis");
    let extractor = SlowExtractor::default();
    let config = FetcherConfig::builder()
        .ttl(Duration::from_millis(300))
        .build();
    let fetcher = instance(&server, extractor.clone(), config).await;

    fetcher.fetch(URL).await.unwrap();
    fetcher.fetch(URL).await.unwrap();
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;

    fetcher.fetch(URL).await.unwrap();
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_short_hold_never_lets_calls_overlap() {
    let server = RedisServer::start().await.expect("Failed to start Redis");
    let extractor = SlowExtractor::default();
    // The lock lapses after 150ms while an extraction takes 200ms.
    let config = FetcherConfig::builder()
        .lock_hold(Duration::from_millis(150))
        .write_margin(Duration::from_millis(50))
        .build();
    let a = instance(&server, extractor.clone(), config.clone()).await;
    let b = instance(&server, extractor.clone(), config).await;

    let (ra, rb) = tokio::join!(a.fetch(URL), b.fetch(URL));

    assert!(ra.is_err());
    assert!(rb.is_err());
    assert_eq!(extractor.peak_in_flight.load(Ordering::SeqCst), 1);
}
