//! Running counters for a slicing session.
//!
//! Counters are atomics so a monitoring thread can read them while a worker
//! drives the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for one slicing session.
#[derive(Debug)]
pub struct SessionStats {
    /// Records handed to the session
    records_received: AtomicU64,
    /// Records dropped without decoding
    records_skipped: AtomicU64,
    /// Records decoded and sliced
    records_decoded: AtomicU64,
    /// Slices handed to the emitter
    slices_emitted: AtomicU64,
    /// Partial slices dropped at acquisition boundaries or at finish
    partial_slices_discarded: AtomicU64,
    /// Acquisition id changes across received records (including the first)
    acquisitions_seen: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            records_received: AtomicU64::new(0),
            records_skipped: AtomicU64::new(0),
            records_decoded: AtomicU64::new(0),
            slices_emitted: AtomicU64::new(0),
            partial_slices_discarded: AtomicU64::new(0),
            acquisitions_seen: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_received(&self) {
        self.records_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decoded(&self) {
        self.records_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn slice_emitted(&self) {
        self.slices_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn partial_slices_discarded(&self, count: u64) {
        self.partial_slices_discarded
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn acquisition_started(&self) {
        self.acquisitions_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            records_decoded: self.records_decoded.load(Ordering::Relaxed),
            slices_emitted: self.slices_emitted.load(Ordering::Relaxed),
            partial_slices_discarded: self.partial_slices_discarded.load(Ordering::Relaxed),
            acquisitions_seen: self.acquisitions_seen.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_ms: (Utc::now() - self.session_start).num_milliseconds().max(0)
                as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Records received: {}\n\
             - Records skipped: {}\n\
             - Records decoded: {}\n\
             - Slices emitted: {}\n\
             - Partial slices discarded: {}\n\
             - Acquisitions seen: {}\n\
             - Session duration: {} ms",
            stats.records_received,
            stats.records_skipped,
            stats.records_decoded,
            stats.slices_emitted,
            stats.partial_slices_discarded,
            stats.acquisitions_seen,
            stats.session_duration_ms
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatsSnapshot {
    pub records_received: u64,
    pub records_skipped: u64,
    pub records_decoded: u64,
    pub slices_emitted: u64,
    pub partial_slices_discarded: u64,
    pub acquisitions_seen: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_ms: u64,
}

/// Thread-safe shared session statistics.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create new shared session statistics.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}
