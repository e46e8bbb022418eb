mod cli;

use std::sync::Arc;
use std::time::Duration;

use crate::cli::{CacheBackendArg, CLI};
use clap::Parser;
use embedworks_cache::{InMemoryStore, RedisStore};
use embedworks_core::{CacheStore, HostResolver};
use embedworks_fetcher::{lock_hold_for, parse_ttl, CachedFetcher, Fetcher, FetcherConfig, UfysClient};
use embedworks_gateway::{App, AppState, BotDetector};
use embedworks_telemetry::LogFormat;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;

    let log_format: LogFormat = config.log_format.parse().map_err(anyhow::Error::msg)?;
    embedworks_telemetry::init(log_format)?;

    let resolver = HostResolver::from_list(&config.base_hosts);
    if resolver.base_hosts().is_empty() {
        warn!("no base hosts configured, every request will be rejected");
    }

    let upstream_timeout = Duration::from_secs(config.upstream_timeout);
    // The lock must outlive the longest extraction plus its cache write.
    let fetcher_config = FetcherConfig::builder()
        .ttl(parse_ttl(config.cache_ttl.as_deref()))
        .lock_wait(Duration::from_secs(config.lock_timeout))
        .lock_hold(lock_hold_for(upstream_timeout))
        .build();
    let extractor = UfysClient::new(&config.ufys_url, upstream_timeout)?;

    info!(
        listen_addr = %config.listen_addr,
        base_hosts = ?resolver.base_hosts(),
        ufys_url = %extractor.endpoint(),
        cache_backend = %config.cache_backend,
        ttl_secs = fetcher_config.ttl.as_secs(),
        lock_hold_secs = fetcher_config.lock_hold.as_secs(),
        "starting embed gateway"
    );

    let fetcher = match config.cache_backend {
        CacheBackendArg::Redis => {
            let store = RedisStore::connect(&format!("redis://{}/", config.redis_host)).await?;
            into_fetcher(store, extractor, fetcher_config)
        }
        CacheBackendArg::InMemory => into_fetcher(InMemoryStore::new(), extractor, fetcher_config),
    };

    let state = AppState::new(fetcher, resolver, BotDetector::new()?);
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, App::router(state)).await?;

    Ok(())
}

fn into_fetcher<S: CacheStore>(
    store: S,
    extractor: UfysClient,
    config: FetcherConfig,
) -> Arc<dyn Fetcher> {
    Arc::new(CachedFetcher::new(store, extractor, config))
}
