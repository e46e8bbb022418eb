use crate::model::HealthResponse;
use axum::http::StatusCode;
use axum::Json;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn favicon_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "shush")
}
