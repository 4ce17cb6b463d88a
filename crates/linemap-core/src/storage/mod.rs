//! Persistence of the scene.
//!
//! The scene is stored whole, as JSON, under a fixed key. Every stored copy
//! carries the id of the editor that wrote it so an editor can recognize its
//! own writes when they come back as remote updates.

mod memory;
mod sync;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;
pub use sync::SaveQueue;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::scene::SceneData;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Key the map scene is stored under.
pub const SCENE_KEY: &str = "linemap";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Scene not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A persisted scene and the editor that wrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScene {
    pub origin: Uuid,
    pub data: SceneData,
}

impl StoredScene {
    pub fn new(origin: Uuid, data: SceneData) -> Self {
        Self { origin, data }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Trait for scene storage backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Save a scene.
    fn save(&self, key: &str, scene: &StoredScene) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a scene.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<StoredScene>>;

    /// Delete a scene.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a scene exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Trait for scene storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Save a scene.
    fn save(&self, key: &str, scene: &StoredScene) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a scene.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<StoredScene>>;

    /// Delete a scene.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a scene exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::default_location()?))
}

/// Create a platform-appropriate storage backend.
///
/// The browser host persists through its own store; in-process the scene is
/// kept in memory.
#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<dyn Storage>> {
    Ok(Arc::new(MemoryStorage::new()))
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
