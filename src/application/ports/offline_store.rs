use crate::domain::entities::PendingWrite;
use crate::domain::value_objects::{PendingWriteId, WritePayload};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable queue of writes captured while offline.
///
/// Every operation is atomic for a single entry. Implementations must report
/// storage failures as [`AppError::StorageUnavailable`] instead of dropping
/// the write.
#[async_trait]
pub trait PendingWriteStore: Send + Sync {
    /// Appends a write with `synced = false` and returns its id once durable.
    async fn enqueue(&self, payload: WritePayload) -> Result<PendingWriteId, AppError> {
        let id = PendingWriteId::generate();
        self.enqueue_with_id(id.clone(), payload).await?;
        Ok(id)
    }

    /// Appends a write under an id the caller already used as an
    /// idempotency key. Fails if the id is already queued.
    async fn enqueue_with_id(
        &self,
        id: PendingWriteId,
        payload: WritePayload,
    ) -> Result<(), AppError>;

    /// Unsynced entries, oldest first.
    async fn list_pending(&self) -> Result<Vec<PendingWrite>, AppError>;

    /// Removes the entry after server acknowledgment. Unknown ids are a no-op.
    async fn mark_synced(&self, id: &PendingWriteId) -> Result<(), AppError>;

    /// Records a failed replay attempt. Unknown ids are a no-op.
    async fn record_failure(&self, id: &PendingWriteId, reason: &str) -> Result<(), AppError>;

    /// Drops an entry on application request. Returns whether it existed.
    async fn discard(&self, id: &PendingWriteId) -> Result<bool, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}
