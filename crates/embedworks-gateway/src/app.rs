use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{embed_handler, favicon_handler, health_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    /// Every path not claimed by a service route is an embed request.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/_/health", get(health_handler))
            .route("/favicon.ico", get(favicon_handler))
            .route("/", get(embed_handler))
            .route("/{*path}", get(embed_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
