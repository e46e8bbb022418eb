use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("timed out acquiring lock '{0}'")]
    LockTimeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Failures raised while turning an inbound request into extraction results.
///
/// A decoded [`ExtractionResult::Error`](crate::ExtractionResult::Error) is
/// not represented here: it is a valid, negative result and travels the
/// success path.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("host '{0}' matches no configured base host")]
    UnresolvableHost(String),
    #[error("target is not a valid url: {0}")]
    InvalidTargetUrl(String),
    #[error("timed out waiting for fetch lock on '{0}'")]
    LockTimeout(String),
    #[error("extraction service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("invalid extraction service response ({code}): {message}")]
    InvalidUpstreamResponse { code: String, message: String },
    #[error("cache error: {0}")]
    Cache(CacheError),
}

impl Error {
    pub const INVALID_RESPONSE_CODE: &'static str = "invalid_upstream_response";

    /// The generic error returned when an upstream payload has no usable entry.
    pub fn invalid_upstream_response(message: impl Into<String>) -> Self {
        Error::InvalidUpstreamResponse {
            code: Self::INVALID_RESPONSE_CODE.to_string(),
            message: message.into(),
        }
    }

    /// Whether a client may retry the same request and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::LockTimeout(_) | Error::UpstreamUnavailable(_) => true,
            Error::Cache(CacheError::Unavailable(_) | CacheError::Timeout(_)) => true,
            _ => false,
        }
    }
}

impl From<CacheError> for Error {
    fn from(value: CacheError) -> Self {
        match value {
            CacheError::LockTimeout(key) => Error::LockTimeout(key),
            other => Error::Cache(other),
        }
    }
}
