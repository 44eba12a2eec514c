use super::network_monitor::NetworkMonitor;
use super::sync_coordinator::{IDEMPOTENCY_KEY_HEADER, SyncCoordinator};
use crate::application::ports::{HttpFetcher, PendingWriteStore};
use crate::domain::entities::{
    FetchedResponse, OutgoingRequest, PendingWrite, SyncOutcome, SyncState, SyncTrigger,
};
use crate::domain::value_objects::{PendingWriteId, WritePayload};
use crate::shared::error::AppError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The server answered; the response is returned unmodified.
    Sent(FetchedResponse),
    /// Stored for the next sync pass.
    Queued(PendingWriteId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatus {
    pub online: bool,
    pub pending: u64,
    pub syncing: bool,
    pub has_data_to_sync: bool,
}

/// Application-facing entry point to the offline subsystem.
pub struct OfflineClient {
    store: Arc<dyn PendingWriteStore>,
    fetcher: Arc<dyn HttpFetcher>,
    monitor: Arc<NetworkMonitor>,
    coordinator: Arc<SyncCoordinator>,
}

impl OfflineClient {
    pub fn new(
        store: Arc<dyn PendingWriteStore>,
        fetcher: Arc<dyn HttpFetcher>,
        monitor: Arc<NetworkMonitor>,
        coordinator: Arc<SyncCoordinator>,
    ) -> Self {
        Self {
            store,
            fetcher,
            monitor,
            coordinator,
        }
    }

    /// Sends the write directly when online; queues it otherwise, or when
    /// the direct send fails at the transport level. A queued write keeps the
    /// idempotency key of the failed send.
    pub async fn submit(&self, payload: WritePayload) -> Result<SubmitOutcome, AppError> {
        let key = PendingWriteId::generate();
        if self.monitor.is_online() {
            let request =
                OutgoingRequest::post_json(self.coordinator.endpoint().clone(), payload.as_json())?
                    .with_header(IDEMPOTENCY_KEY_HEADER, key.as_str());
            match self.fetcher.fetch(&request).await {
                Ok(response) => return Ok(SubmitOutcome::Sent(response)),
                Err(err) if err.is_offline() => {
                    tracing::info!(
                        target: "offline::sync",
                        error = %err,
                        "direct send failed; queueing write"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.store.enqueue_with_id(key.clone(), payload).await?;
        Ok(SubmitOutcome::Queued(key))
    }

    pub async fn enqueue_for_sync(&self, payload: WritePayload) -> Result<PendingWriteId, AppError> {
        self.store.enqueue(payload).await
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.count().await
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingWrite>, AppError> {
        self.store.list_pending().await
    }

    pub async fn discard(&self, id: &PendingWriteId) -> Result<bool, AppError> {
        let existed = self.store.discard(id).await?;
        if existed {
            tracing::info!(target: "offline::store", id = %id, "pending write discarded");
        }
        Ok(existed)
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    pub async fn request_sync(&self) -> SyncOutcome {
        self.coordinator.sync_now(SyncTrigger::Manual).await
    }

    pub fn sync_state(&self) -> SyncState {
        self.coordinator.state()
    }

    pub async fn status(&self) -> Result<ClientStatus, AppError> {
        let pending = self.pending_count().await?;
        Ok(ClientStatus {
            online: self.is_online(),
            pending,
            syncing: self.sync_state() == SyncState::Syncing,
            has_data_to_sync: pending > 0,
        })
    }
}
