use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "EW_LISTEN_ADDR";
pub const BASE_HOSTS_ENV: &str = "BASE_HOSTS";
pub const UFYS_URL_ENV: &str = "UFYS_URL";
pub const CACHE_BACKEND_ENV: &str = "EW_CACHE_BACKEND";
pub const REDIS_HOST_ENV: &str = "REDIS_HOST";
pub const CACHE_TTL_ENV: &str = "CACHE_TTL";
pub const LOCK_TIMEOUT_ENV: &str = "EW_LOCK_TIMEOUT";
pub const UPSTREAM_TIMEOUT_ENV: &str = "EW_UPSTREAM_TIMEOUT";
pub const LOG_FORMAT_ENV: &str = "EW_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = embedworks_fetcher::DEFAULT_UPSTREAM_TIMEOUT.as_secs();
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "redis")]
    Redis,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "embedworks-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Comma-separated hosts the service is reachable under.
    #[arg(long, env = BASE_HOSTS_ENV, default_value = "")]
    pub base_hosts: String,

    /// Base URL of the extraction service.
    #[arg(long, env = UFYS_URL_ENV)]
    pub ufys_url: String,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Redis
    )]
    pub cache_backend: CacheBackendArg,

    #[arg(long, env = REDIS_HOST_ENV, default_value = DEFAULT_REDIS_HOST)]
    pub redis_host: String,

    /// Cache lifetime in seconds; invalid values fall back to the default.
    #[arg(long, env = CACHE_TTL_ENV)]
    pub cache_ttl: Option<String>,

    #[arg(long, env = LOCK_TIMEOUT_ENV, default_value_t = DEFAULT_LOCK_TIMEOUT_SECS)]
    pub lock_timeout: u64,

    #[arg(long, env = UPSTREAM_TIMEOUT_ENV, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout: u64,

    #[arg(long, env = LOG_FORMAT_ENV, default_value = DEFAULT_LOG_FORMAT)]
    pub log_format: String,
}
