use testcontainers::TestcontainersError;
use thiserror::Error;

/// Why a test fixture could not be brought up.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to start container {image}: {source}")]
    Start {
        image: String,
        #[source]
        source: TestcontainersError,
    },

    #[error("failed to look up the mapped endpoint: {0}")]
    Endpoint(#[source] TestcontainersError),

    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: redis::RedisError,
    },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
