use super::{Checkpoint, CheckpointStore, CheckpointStoreError};
use async_trait::async_trait;
use std::collections::HashMap;

/// In-memory checkpoint storage.
///
/// Durable for the lifetime of the process; the only adapter the core
/// ships with.
#[derive(Default)]
pub struct MemoryStore {
    entries: tokio::sync::RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn save(
        &self,
        thread_id: &str,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointStoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(thread_id.to_string(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Checkpoint, CheckpointStoreError> {
        let entries = self.entries.read().await;
        entries
            .get(thread_id)
            .cloned()
            .ok_or_else(|| CheckpointStoreError::NotFound(thread_id.to_string()))
    }

    async fn clear(&self, thread_id: &str) -> Result<(), CheckpointStoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(thread_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointStoreError> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
