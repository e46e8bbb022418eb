//! Cache store implementations for embed-works.
//!
//! [`RedisStore`] is the shared store every gateway instance should use.
//! [`InMemoryStore`] keeps everything inside one process and is meant for
//! tests and single-instance development.

pub mod memory;
pub mod redis;

pub use embedworks_core::cache::{CacheStore, Result};
pub use embedworks_core::CacheError;
pub use memory::InMemoryStore;
pub use redis::RedisStore;
