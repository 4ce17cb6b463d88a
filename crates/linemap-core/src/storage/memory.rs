//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, StoredScene};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    scenes: RwLock<HashMap<String, StoredScene>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, scene: &StoredScene) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let scene = scene.clone();
        Box::pin(async move {
            self.scenes.write().map_err(lock_error)?.insert(key, scene);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<StoredScene>> {
        let key = key.to_string();
        Box::pin(async move {
            let scenes = self.scenes.read().map_err(lock_error)?;
            scenes.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.scenes.write().map_err(lock_error)?.remove(&key);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { Ok(self.scenes.read().map_err(lock_error)?.keys().cloned().collect()) })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.scenes.read().map_err(lock_error)?.contains_key(&key)) })
    }
}
