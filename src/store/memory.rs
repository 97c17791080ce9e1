use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::MenuStore;
use crate::error::ApiError;

/// In-memory store for tests and local experiments. Clones share the
/// same map.
#[derive(Clone, Default)]
pub struct MemoryMenuStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> ApiError {
    ApiError::Internal("menu store lock poisoned".into())
}

#[async_trait]
impl MenuStore for MemoryMenuStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), ApiError> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
