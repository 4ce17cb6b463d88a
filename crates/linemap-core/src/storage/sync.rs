//! Serialized, coalescing persistence of one scene.

use super::{Storage, StorageError, StorageResult, StoredScene};
use std::sync::Arc;

/// Queues scene saves for a single key.
///
/// Mutations enqueue the latest state and carry on; [`SaveQueue::flush`]
/// writes it out. Only the newest state is kept, and since flushing needs
/// `&mut self` at most one save per queue is ever in flight.
pub struct SaveQueue {
    storage: Arc<dyn Storage>,
    key: String,
    pending: Option<StoredScene>,
    saves: usize,
}

impl SaveQueue {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            pending: None,
            saves: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queue `scene` for saving, replacing anything not yet written.
    pub fn enqueue(&mut self, scene: StoredScene) {
        if self.pending.replace(scene).is_some() {
            log::debug!("Coalesced unsaved state for '{}'", self.key);
        }
    }

    /// Whether there is state waiting to be written.
    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of successful writes so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Write the queued state, if any. Returns whether a save happened.
    ///
    /// On failure the state stays queued for the next flush.
    pub async fn flush(&mut self) -> StorageResult<bool> {
        let Some(scene) = self.pending.take() else {
            return Ok(false);
        };
        match self.storage.save(&self.key, &scene).await {
            Ok(()) => {
                self.saves += 1;
                log::info!("Saved '{}' ({} objects)", self.key, scene.data.objects.len());
                Ok(true)
            }
            Err(err) => {
                log::error!("Failed to save '{}': {}", self.key, err);
                self.pending = Some(scene);
                Err(err)
            }
        }
    }

    /// Load the stored scene. A missing scene is not an error.
    pub async fn load(&self) -> StorageResult<Option<StoredScene>> {
        match self.storage.load(&self.key).await {
            Ok(scene) => Ok(Some(scene)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for SaveQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveQueue")
            .field("key", &self.key)
            .field("dirty", &self.is_dirty())
            .field("saves", &self.saves)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneData;
    use crate::storage::{BoxFuture, MemoryStorage, block_on};
    use uuid::Uuid;

    fn scene(scale: f64) -> StoredScene {
        StoredScene::new(
            Uuid::new_v4(),
            SceneData {
                symbol_scale: scale,
                ..SceneData::default()
            },
        )
    }

    /// Storage whose writes always fail.
    struct ReadOnly;

    impl Storage for ReadOnly {
        fn save(&self, _key: &str, _scene: &StoredScene) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("read-only".to_string())) })
        }

        fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<StoredScene>> {
            let key = key.to_string();
            Box::pin(async move { Err(StorageError::NotFound(key)) })
        }

        fn delete(&self, _key: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn exists(&self, _key: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Ok(false) })
        }
    }

    #[test]
    fn test_last_writer_wins() {
        let storage = Arc::new(MemoryStorage::new());
        let mut queue = SaveQueue::new(storage.clone(), "map");

        queue.enqueue(scene(1.0));
        queue.enqueue(scene(2.0));
        assert!(queue.is_dirty());

        assert!(block_on(queue.flush()).unwrap());
        assert!(!queue.is_dirty());
        assert_eq!(queue.save_count(), 1);
        assert_eq!(block_on(storage.load("map")).unwrap().data.symbol_scale, 2.0);

        // Nothing left to write.
        assert!(!block_on(queue.flush()).unwrap());
        assert_eq!(queue.save_count(), 1);
    }

    #[test]
    fn test_failed_save_stays_queued() {
        let mut queue = SaveQueue::new(Arc::new(ReadOnly), "map");
        queue.enqueue(scene(3.0));

        assert!(matches!(block_on(queue.flush()), Err(StorageError::Io(_))));
        assert!(queue.is_dirty());
        assert_eq!(queue.save_count(), 0);
    }

    #[test]
    fn test_load_missing_is_none() {
        let queue = SaveQueue::new(Arc::new(MemoryStorage::new()), "map");
        assert!(block_on(queue.load()).unwrap().is_none());
    }
}
