//! HTTP surface of embed-works.
//!
//! Resolves the requested host and path to a canonical URL, picks a
//! response mode, and presents the extraction results for that mode.

pub mod app;
pub mod bot;
pub mod error;
pub mod handlers;
pub mod model;
pub mod render;
pub mod state;

pub use app::App;
pub use bot::BotDetector;
pub use error::{AppError, Result};
pub use state::AppState;
