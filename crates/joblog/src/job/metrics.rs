use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::Serialize;

use super::refresher::TickOutcome;

/// Refresher counters, shared by every refresher task.
///
/// All operations use `Ordering::Relaxed`; a snapshot may mix values from
/// ticks that ran concurrently.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    ticks: AtomicU64,
    increments: AtomicU64,
    status_checks: AtomicU64,
    finished_jobs: AtomicU64,
    fetch_failures: AtomicU64,
    status_failures: AtomicU64,
    active_refreshers: AtomicI64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, outcome: TickOutcome) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        match outcome {
            TickOutcome::Updated => {
                self.increments.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Finished => {
                self.finished_jobs.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Dispose | TickOutcome::Unchanged | TickOutcome::Failed => {}
        }
    }

    pub fn record_status_check(&self) {
        self.status_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_failure(&self) {
        self.status_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresher_started(&self) {
        self.active_refreshers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresher_stopped(&self) {
        self.active_refreshers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RefreshSnapshot {
        RefreshSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            increments: self.increments.load(Ordering::Relaxed),
            status_checks: self.status_checks.load(Ordering::Relaxed),
            finished_jobs: self.finished_jobs.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            status_failures: self.status_failures.load(Ordering::Relaxed),
            active_refreshers: self.active_refreshers.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSnapshot {
    pub ticks: u64,
    pub increments: u64,
    pub status_checks: u64,
    pub finished_jobs: u64,
    pub fetch_failures: u64,
    pub status_failures: u64,
    pub active_refreshers: i64,
}
