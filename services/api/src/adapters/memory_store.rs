//! services/api/src/adapters/memory_store.rs
//!
//! A process-local `KeyValueStore`. Entries keep their insertion order and
//! are lost when the process exits.

use async_trait::async_trait;
use job_board_core::{KeyValueStore, PortResult};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<Vec<(String, Vec<u8>)>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> PortResult<()> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.write().await.retain(|(k, _)| k != key);
        Ok(())
    }

    async fn get_all_under_prefix(&self, prefix: &str) -> PortResult<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
