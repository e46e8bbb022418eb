mod embed;
mod health;

pub use embed::embed_handler;
pub use health::{favicon_handler, health_handler};
