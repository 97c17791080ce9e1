// Library exports for the API binary, seed tooling and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::changefeed::ChangeFeed;
use crate::services::menu_window::MenuWindowManager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: redis::aio::MultiplexedConnection,
    pub redis_client: RedisClient,
    pub config: Arc<Config>,
    pub menu: MenuWindowManager,
    pub feed: ChangeFeed,
}
