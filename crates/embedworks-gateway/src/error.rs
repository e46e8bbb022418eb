use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use embedworks_core::{Error, ExtractionError};
use thiserror::Error;
use tracing::{error, warn};

use crate::render;

pub type Result<T> = std::result::Result<T, AppError>;

/// Seconds a client should wait before retrying a transient failure.
const RETRY_AFTER_SECS: &str = "5";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] Error),
}

fn error_body(code: impl Into<String>, message: impl Into<String>) -> Response {
    render::page(&render::error_page(&[ExtractionError::new(code, message)]))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Engine(err) = self;
        match err {
            Error::UnresolvableHost(_) | Error::InvalidTargetUrl(_) => {
                warn!(error = %err, "Rejecting request");
                (
                    StatusCode::BAD_REQUEST,
                    error_body("bad request", "unable to parse url"),
                )
                    .into_response()
            }
            Error::LockTimeout(key) => {
                warn!(key = %key, "Fetch lock wait timed out");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                    error_body(
                        "busy",
                        "this link is being fetched right now, try again in a moment",
                    ),
                )
                    .into_response()
            }
            Error::UpstreamUnavailable(message) => {
                error!(error = %message, "Extraction service unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    [(header::RETRY_AFTER, RETRY_AFTER_SECS)],
                    error_body("upstream unavailable", message),
                )
                    .into_response()
            }
            Error::InvalidUpstreamResponse { code, message } => {
                error!(code = %code, error = %message, "Extraction service broke its contract");
                (
                    StatusCode::BAD_GATEWAY,
                    error_body(code, message),
                )
                    .into_response()
            }
            Error::Cache(source) => {
                error!(error = %source, "Cache store failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body(
                        "unknown error",
                        format!("something went REALLY wrong ({source})"),
                    ),
                )
                    .into_response()
            }
        }
    }
}
