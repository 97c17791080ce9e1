pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::ApiError;

pub use self::memory::MemoryMenuStore;
pub use self::redis::RedisMenuStore;

/// Keyed string storage behind the menu window. The window manager is
/// written against this trait so tests can swap the Redis backend for an
/// in-memory one.
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;

    async fn clear(&self, key: &str) -> Result<(), ApiError>;
}
