use crate::application::ports::response_cache::ResponseCache;
use crate::domain::entities::CachedResponse;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Partitions = HashMap<String, HashMap<String, CachedResponse>>;

/// In-process response cache. Contents do not survive a restart.
#[derive(Clone, Default)]
pub struct MemoryResponseCache {
    partitions: Arc<RwLock<Partitions>>,
}

impl MemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, AppError> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        partition: &str,
        key: &str,
        response: CachedResponse,
    ) -> Result<(), AppError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), AppError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.to_string())
            .or_default()
            .extend(entries);
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, AppError> {
        let mut partitions = self.partitions.write().await;
        Ok(partitions.remove(partition).is_some())
    }

    async fn partitions(&self) -> Result<Vec<String>, AppError> {
        let partitions = self.partitions.read().await;
        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn len(&self, partition: &str) -> Result<u64, AppError> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .map(|entries| entries.len() as u64)
            .unwrap_or(0))
    }
}
