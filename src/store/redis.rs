use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use super::MenuStore;
use crate::error::ApiError;

/// Redis-backed store used in production. The multiplexed connection is
/// cheap to clone, so each operation works on its own handle.
#[derive(Clone)]
pub struct RedisMenuStore {
    conn: MultiplexedConnection,
}

impl RedisMenuStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MenuStore for RedisMenuStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}
