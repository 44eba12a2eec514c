use crate::domain::entities::{SyncReport, SyncTrigger};
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every attempted write was acknowledged.
    Clean,
    /// At least one write stayed pending.
    Partial,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub total_synced: u64,
    pub total_failed: u64,
    pub consecutive_partial_passes: u64,
    pub last_outcome: Option<PassOutcome>,
    pub last_trigger: Option<SyncTrigger>,
    pub last_duration_ms: Option<u64>,
    pub last_remaining: Option<u32>,
    pub last_finished_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastPass {
    outcome: Option<PassOutcome>,
    trigger: Option<SyncTrigger>,
    duration_ms: Option<u64>,
    remaining: Option<u32>,
    finished_ms: Option<u64>,
}

/// Per-coordinator sync counters.
pub struct SyncMetrics {
    passes: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    consecutive_partial: AtomicU64,
    last: Mutex<LastPass>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            consecutive_partial: AtomicU64::new(0),
            last: Mutex::new(LastPass::default()),
        }
    }

    pub fn record(&self, report: &SyncReport) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(report.failed), Ordering::Relaxed);

        let outcome = if report.failed == 0 {
            self.consecutive_partial.store(0, Ordering::Relaxed);
            PassOutcome::Clean
        } else {
            self.consecutive_partial.fetch_add(1, Ordering::Relaxed);
            PassOutcome::Partial
        };

        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.trigger = Some(report.trigger);
            guard.duration_ms = Some(report.duration_ms().max(0) as u64);
            guard.remaining = Some(report.remaining);
            guard.finished_ms = Some(report.finished_at.timestamp_millis().max(0) as u64);
        }
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            consecutive_partial_passes: self.consecutive_partial.load(Ordering::Relaxed),
            last_outcome: last.outcome,
            last_trigger: last.trigger,
            last_duration_ms: last.duration_ms,
            last_remaining: last.remaining,
            last_finished_ms: last.finished_ms,
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn report(synced: u32, failed: u32) -> SyncReport {
        let started_at = Utc::now();
        SyncReport {
            trigger: SyncTrigger::Manual,
            attempted: synced + failed,
            synced,
            failed,
            remaining: failed,
            started_at,
            finished_at: started_at + Duration::milliseconds(40),
        }
    }

    #[test]
    fn record_clean_and_partial_passes() {
        let metrics = SyncMetrics::new();
        assert_eq!(metrics.snapshot().last_outcome, None);

        metrics.record(&report(3, 0));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_passes, 1);
        assert_eq!(snapshot.total_synced, 3);
        assert_eq!(snapshot.last_outcome, Some(PassOutcome::Clean));
        assert_eq!(snapshot.last_duration_ms, Some(40));

        metrics.record(&report(1, 2));
        metrics.record(&report(0, 2));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_passes, 3);
        assert_eq!(snapshot.total_failed, 4);
        assert_eq!(snapshot.consecutive_partial_passes, 2);
        assert_eq!(snapshot.last_outcome, Some(PassOutcome::Partial));
        assert_eq!(snapshot.last_remaining, Some(2));

        metrics.record(&report(2, 0));
        assert_eq!(metrics.snapshot().consecutive_partial_passes, 0);
    }
}
