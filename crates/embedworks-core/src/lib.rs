//! Core types and traits for the embed-works resolution engine.
//!
//! This crate holds the pieces shared by the fetcher and the gateway:
//! the extraction result model and its decoder, response mode selection,
//! host/path target resolution, and the [`CacheStore`] abstraction.

pub mod cache;
pub mod decode;
pub mod error;
pub mod mode;
pub mod model;
pub mod resolve;

pub use cache::{data_key, lock_key, CacheStore};
pub use decode::decode_results;
pub use error::{CacheError, Error, Result};
pub use mode::{determine_mode, ResponseMode, MODE_PARAM_KEY, TRACE_PARAM_KEY};
pub use model::{ExtractionError, ExtractionResult, VideoInfo};
pub use resolve::{canonical_url, mode_url, HostResolver};
