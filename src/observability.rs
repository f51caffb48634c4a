//! Reconciliation counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every reconciliation of a process
#[derive(Debug, Default)]
pub struct Metrics {
    created: AtomicU64,
    refreshed: AtomicU64,
    deleted: AtomicU64,
    went_absent: AtomicU64,
    failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn application_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "created", "Metric incremented");
    }

    pub fn application_refreshed(&self) {
        self.refreshed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "refreshed", "Metric incremented");
    }

    pub fn application_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "deleted", "Metric incremented");
    }

    /// The remote application disappeared outside of a delete
    pub fn application_absent(&self) {
        self.went_absent.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "went_absent", "Metric incremented");
    }

    pub fn reconciliation_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            refreshed: self.refreshed.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            went_absent: self.went_absent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub created: u64,
    pub refreshed: u64,
    pub deleted: u64,
    pub went_absent: u64,
    pub failed: u64,
}
