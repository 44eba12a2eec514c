use super::sync_metrics::{SyncMetrics, SyncMetricsSnapshot};
use crate::application::ports::{HttpFetcher, PendingWriteStore};
use crate::domain::entities::{
    ConnectivityEvent, OutgoingRequest, PendingWrite, SyncOutcome, SyncReport, SyncState,
    SyncTrigger,
};
use crate::shared::config::{ApiConfig, SyncConfig};
use crate::shared::error::AppError;
use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tokio::task::JoinHandle;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const CREATED_AT_HEADER: &str = "x-offline-created-at";

/// Replays pending writes against the sync endpoint.
///
/// At most one pass runs at a time. A trigger that arrives while a pass is
/// running is folded into one extra pass performed by the running caller.
pub struct SyncCoordinator {
    store: Arc<dyn PendingWriteStore>,
    fetcher: Arc<dyn HttpFetcher>,
    endpoint: Url,
    tag: String,
    gate: Mutex<()>,
    rerun: AtomicBool,
    state: watch::Sender<SyncState>,
    metrics: SyncMetrics,
}

impl SyncCoordinator {
    pub fn new(
        store: Arc<dyn PendingWriteStore>,
        fetcher: Arc<dyn HttpFetcher>,
        api: &ApiConfig,
        sync: &SyncConfig,
    ) -> Result<Self, AppError> {
        let origin = api.origin_url().map_err(AppError::Configuration)?;
        let endpoint = origin
            .join(&api.sync_endpoint)
            .map_err(|e| AppError::Configuration(format!("Invalid sync endpoint: {e}")))?;
        let (state, _) = watch::channel(SyncState::Idle);

        Ok(Self {
            store,
            fetcher,
            endpoint,
            tag: sync.tag.clone(),
            gate: Mutex::new(()),
            rerun: AtomicBool::new(false),
            state,
            metrics: SyncMetrics::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn try_begin(&self) -> Option<MutexGuard<'_, ()>> {
        if let Ok(guard) = self.gate.try_lock() {
            return Some(guard);
        }
        self.rerun.store(true, Ordering::SeqCst);
        // the running pass may have finished between the two attempts
        self.gate.try_lock().ok()
    }

    pub async fn sync_now(&self, trigger: SyncTrigger) -> SyncOutcome {
        let Some(mut guard) = self.try_begin() else {
            tracing::debug!(
                target: "offline::sync",
                trigger = trigger.as_str(),
                "pass already running; coalesced"
            );
            return SyncOutcome::Coalesced;
        };

        let mut combined: Option<SyncReport> = None;
        loop {
            self.rerun.store(false, Ordering::SeqCst);
            self.state.send_replace(SyncState::Syncing);
            let report = self.run_pass(trigger).await;
            self.state.send_replace(SyncState::Idle);
            combined = Some(match combined {
                Some(previous) => merge(previous, report),
                None => report,
            });
            drop(guard);

            if !self.rerun.load(Ordering::SeqCst) {
                break;
            }
            match self.gate.try_lock() {
                Ok(next) => guard = next,
                // another caller owns the rerun now
                Err(_) => break,
            }
        }

        match combined {
            Some(report) => SyncOutcome::Completed(report),
            None => SyncOutcome::Coalesced,
        }
    }

    /// Runs a pass when `tag` is the configured background sync tag.
    pub async fn handle_sync_signal(&self, tag: &str) -> Option<SyncOutcome> {
        if tag != self.tag {
            tracing::debug!(target: "offline::sync", tag, "ignoring unknown sync tag");
            return None;
        }
        Some(self.sync_now(SyncTrigger::BackgroundSignal).await)
    }

    /// Runs a pass on every `became-online` event while writes are pending.
    pub fn spawn_auto_sync(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<ConnectivityEvent>,
    ) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ConnectivityEvent::BecameOnline) => match coordinator.store.count().await {
                        Ok(0) => {}
                        Ok(pending) => {
                            tracing::info!(
                                target: "offline::sync",
                                pending,
                                "connection restored; syncing"
                            );
                            coordinator.sync_now(SyncTrigger::Reconnect).await;
                        }
                        Err(err) => tracing::warn!(
                            target: "offline::sync",
                            error = %err,
                            "failed to count pending writes on reconnect"
                        ),
                    },
                    Ok(ConnectivityEvent::BecameOffline) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(target: "offline::sync", skipped, "connectivity events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn run_pass(&self, trigger: SyncTrigger) -> SyncReport {
        let started_at = Utc::now();
        let pending = match self.store.list_pending().await {
            Ok(pending) => pending,
            Err(err) => {
                tracing::warn!(
                    target: "offline::sync",
                    error = %err,
                    "failed to read pending writes"
                );
                Vec::new()
            }
        };

        let attempted = pending.len() as u32;
        let mut synced = 0u32;
        let mut failed = 0u32;

        for write in &pending {
            match self.replay(write).await {
                Ok(()) => match self.store.mark_synced(&write.id).await {
                    Ok(()) => synced += 1,
                    Err(err) => {
                        failed += 1;
                        tracing::warn!(
                            target: "offline::sync",
                            id = %write.id,
                            error = %err,
                            "acknowledged write could not be removed; it will be replayed"
                        );
                    }
                },
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        target: "offline::sync",
                        id = %write.id,
                        attempts = write.attempts + 1,
                        error = %err,
                        "replay failed; keeping write pending"
                    );
                    let reason = err.to_string();
                    if let Err(store_err) = self.store.record_failure(&write.id, &reason).await {
                        tracing::warn!(
                            target: "offline::sync",
                            id = %write.id,
                            error = %store_err,
                            "failed to record replay failure"
                        );
                    }
                }
            }
        }

        let remaining = match self.store.count().await {
            Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
            Err(_) => failed,
        };

        let report = SyncReport {
            trigger,
            attempted,
            synced,
            failed,
            remaining,
            started_at,
            finished_at: Utc::now(),
        };
        self.metrics.record(&report);
        tracing::info!(
            target: "offline::sync",
            trigger = trigger.as_str(),
            attempted,
            synced,
            failed,
            remaining,
            duration_ms = report.duration_ms(),
            "sync pass finished"
        );
        report
    }

    async fn replay(&self, write: &PendingWrite) -> Result<(), AppError> {
        let request = OutgoingRequest::post_json(self.endpoint.clone(), write.payload.as_json())?
            .with_header(IDEMPOTENCY_KEY_HEADER, write.id.as_str())
            .with_header(CREATED_AT_HEADER, &write.created_at.to_rfc3339());

        let response = self.fetcher.fetch(&request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(AppError::ServerRejection {
                status: response.status,
                body: response.text(),
            })
        }
    }
}

fn merge(previous: SyncReport, next: SyncReport) -> SyncReport {
    SyncReport {
        trigger: previous.trigger,
        attempted: previous.attempted + next.attempted,
        synced: previous.synced + next.synced,
        failed: previous.failed + next.failed,
        remaining: next.remaining,
        started_at: previous.started_at,
        finished_at: next.finished_at,
    }
}
