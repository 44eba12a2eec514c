use crate::domain::entities::CachedResponse;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Named partitions of cached responses keyed by request identity.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, AppError>;

    /// Last-write-wins replacement of a single entry.
    async fn put(
        &self,
        partition: &str,
        key: &str,
        response: CachedResponse,
    ) -> Result<(), AppError>;

    /// Writes all entries or none of them.
    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), AppError>;

    async fn delete_partition(&self, partition: &str) -> Result<bool, AppError>;

    async fn partitions(&self) -> Result<Vec<String>, AppError>;

    async fn len(&self, partition: &str) -> Result<u64, AppError>;
}
