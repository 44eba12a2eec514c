use super::cache_manager::{ActivationReport, CacheManager};
use super::request_interceptor::RequestInterceptor;
use super::sync_coordinator::SyncCoordinator;
use crate::application::ports::{HttpFetcher, NotificationPresenter};
use crate::domain::entities::{
    FetchedResponse, Notification, OutgoingRequest, PushMessage, SyncOutcome,
};
use crate::shared::error::AppError;
use bytes::Bytes;
use reqwest::Url;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(OutgoingRequest),
    Sync { tag: String },
    Push(Bytes),
    NotificationClick(Notification),
}

impl WorkerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Fetch(_) => "fetch",
            WorkerEvent::Sync { .. } => "sync",
            WorkerEvent::Push(_) => "push",
            WorkerEvent::NotificationClick(_) => "notificationclick",
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerReply {
    Installed { assets: usize },
    Activated(ActivationReport),
    Response(FetchedResponse),
    /// `None` when the tag did not belong to this worker.
    Synced(Option<SyncOutcome>),
    NotificationShown(Notification),
    Navigate(Url),
}

/// Single dispatcher for lifecycle, fetch, sync and push events.
pub struct OfflineWorker {
    cache: Arc<CacheManager>,
    interceptor: Arc<RequestInterceptor>,
    coordinator: Arc<SyncCoordinator>,
    fetcher: Arc<dyn HttpFetcher>,
    presenter: Arc<dyn NotificationPresenter>,
}

impl OfflineWorker {
    pub fn new(
        cache: Arc<CacheManager>,
        interceptor: Arc<RequestInterceptor>,
        coordinator: Arc<SyncCoordinator>,
        fetcher: Arc<dyn HttpFetcher>,
        presenter: Arc<dyn NotificationPresenter>,
    ) -> Self {
        Self {
            cache,
            interceptor,
            coordinator,
            fetcher,
            presenter,
        }
    }

    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerReply, AppError> {
        tracing::debug!(target: "offline::worker", event = event.name(), "dispatching");

        match event {
            WorkerEvent::Install => {
                let assets = self.cache.install(self.fetcher.as_ref()).await?;
                Ok(WorkerReply::Installed { assets })
            }
            WorkerEvent::Activate => Ok(WorkerReply::Activated(self.cache.activate().await?)),
            WorkerEvent::Fetch(request) => {
                Ok(WorkerReply::Response(self.interceptor.handle(&request).await))
            }
            WorkerEvent::Sync { tag } => Ok(WorkerReply::Synced(
                self.coordinator.handle_sync_signal(&tag).await,
            )),
            WorkerEvent::Push(data) => {
                let notification = PushMessage::parse(&data);
                self.presenter.show(&notification).await?;
                Ok(WorkerReply::NotificationShown(notification))
            }
            WorkerEvent::NotificationClick(notification) => {
                let target = self
                    .presenter
                    .click(&notification, self.cache.origin())
                    .await?;
                Ok(WorkerReply::Navigate(target))
            }
        }
    }
}
