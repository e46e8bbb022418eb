use async_trait::async_trait;
use embedworks_core::{Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::Extractor;

#[derive(Debug, Serialize)]
struct VideoRequest<'a> {
    url: &'a str,
}

/// HTTP client for the ufys extraction service.
///
/// Calls `POST <base>/video` with `{"url": ...}` and hands back the body.
#[derive(Debug, Clone)]
pub struct UfysClient {
    http: reqwest::Client,
    endpoint: String,
}

impl UfysClient {
    /// Creates a client for the service at `base_url`, giving up on a call
    /// after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(http, base_url))
    }

    /// Uses an already configured [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/video", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Extractor for UfysClient {
    async fn extract(&self, url: &str) -> Result<Vec<u8>> {
        info!(url = %url, endpoint = %self.endpoint, "Requesting extraction");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&VideoRequest { url })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Extraction request failed");
                Error::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        // Extraction failures come back as tagged bodies; a 5xx means the
        // service itself (or a proxy in front of it) is down.
        if status.is_server_error() {
            warn!(url = %url, status = %status, "Extraction service answered with a server error");
            return Err(Error::UpstreamUnavailable(format!(
                "extraction service answered {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read extraction response");
            Error::UpstreamUnavailable(e.to_string())
        })?;
        debug!(url = %url, status = %status, bytes = body.len(), "Extraction response received");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> UfysClient {
        UfysClient::new(base_url, Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(client("http://ufys:8000/").endpoint(), "http://ufys:8000/video");
        assert_eq!(client("http://ufys:8000").endpoint(), "http://ufys:8000/video");
    }

    #[tokio::test]
    async fn posts_url_and_returns_body() {
        let base = serve(Router::new().route(
            "/video",
            post(|Json(body): Json<Value>| async move {
                Json(json!([{"_class": "UfysError", "code": "echo", "message": body["url"]}]))
            }),
        ))
        .await;

        let raw = client(&base).extract("https://example.com/v").await.unwrap();
        let value: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value[0]["message"], "https://example.com/v");
    }

    #[tokio::test]
    async fn client_errors_still_return_body() {
        let base = serve(Router::new().route(
            "/video",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!([{"_class": "UfysError", "code": "unsupported", "message": ""}])),
                )
            }),
        ))
        .await;

        let raw = client(&base).extract("https://example.com/v").await.unwrap();
        assert!(!raw.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let base = serve(Router::new().route(
            "/video",
            post(|| async { StatusCode::BAD_GATEWAY }),
        ))
        .await;

        let err = client(&base).extract("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .extract("https://example.com/v")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let base = serve(Router::new().route(
            "/video",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "[]"
            }),
        ))
        .await;

        let err = client(&base).extract("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
