use async_trait::async_trait;
use embedworks_core::Result;

/// The extraction service, seen as an opaque source of raw JSON payloads.
#[async_trait]
pub trait Extractor: Send + Sync + 'static {
    /// Requests extraction results for `url` and returns the raw response body.
    ///
    /// Transport failures are reported as
    /// [`Error::UpstreamUnavailable`](embedworks_core::Error::UpstreamUnavailable).
    async fn extract(&self, url: &str) -> Result<Vec<u8>>;
}
