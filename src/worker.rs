//! Background thread driving a slicing session from a record channel.
//!
//! The worker pulls records off a crossbeam receiver and feeds them to its
//! session one at a time. Cancellation is checked between records only, so a
//! record that has started is always fully consumed. The session finishes when
//! the sender hangs up or the worker is cancelled.

use crate::core::SlicerSession;
use crate::emit::SliceEmitter;
use crate::error::{Result, SlicerError};
use crate::source::Record;
use crate::stats::{SessionStatsSnapshot, SharedSessionStats};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// How long the worker waits for a record before re-checking cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a slicing session running on its own thread.
pub struct SlicerWorker {
    handle: JoinHandle<Result<SessionStatsSnapshot>>,
    cancelled: Arc<AtomicBool>,
    stats: SharedSessionStats,
}

impl SlicerWorker {
    /// Move `session` onto a new thread fed by `records`.
    pub fn spawn<E>(session: SlicerSession<E>, records: Receiver<Record>) -> std::io::Result<Self>
    where
        E: SliceEmitter + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let stats = session.stats();

        let flag = cancelled.clone();
        let handle = thread::Builder::new()
            .name("slicer-worker".to_string())
            .spawn(move || run_session(session, records, flag))?;

        Ok(Self {
            handle,
            cancelled,
            stats,
        })
    }

    /// Ask the worker to stop after the record it is processing.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Flag that cancels the worker when set, e.g. from a signal handler.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Live statistics of the running session.
    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return the final session statistics.
    pub fn join(self) -> Result<SessionStatsSnapshot> {
        self.handle.join().map_err(|_| {
            SlicerError::InvariantViolation("slicer worker thread panicked".to_string())
        })?
    }
}

fn run_session<E: SliceEmitter>(
    mut session: SlicerSession<E>,
    records: Receiver<Record>,
    cancelled: Arc<AtomicBool>,
) -> Result<SessionStatsSnapshot> {
    while !cancelled.load(Ordering::SeqCst) {
        match records.recv_timeout(POLL_INTERVAL) {
            Ok(record) => {
                session.on_record(&record)?;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Record source disconnected");
                break;
            }
        }
    }

    if cancelled.load(Ordering::SeqCst) {
        info!(
            dropped = records.len(),
            "Slicer worker cancelled; remaining records are dropped"
        );
    }
    session.finish()
}
