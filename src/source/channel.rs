//! Bounded record channel between a record source and a slicing worker.
//!
//! Records must reach the session strictly in order, so there is exactly one
//! sender handle per channel and it is not `Clone`.

use crate::source::types::Record;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Default channel capacity, in records.
pub const DEFAULT_CAPACITY: usize = 1_024;

/// Errors that can occur while handing records to the worker.
#[derive(Debug)]
pub enum SourceError {
    /// The receiving side has gone away
    Disconnected,
    /// The channel is full (only from [`RecordSender::try_send`])
    Full(Box<Record>),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Disconnected => write!(f, "Record receiver disconnected"),
            SourceError::Full(r) => write!(f, "Record channel full (record {})", r.record_id),
        }
    }
}

impl std::error::Error for SourceError {}

/// The single producer side of a record channel.
pub struct RecordSender {
    sender: Sender<Record>,
    sent: u64,
}

impl RecordSender {
    /// Send a record, blocking while the channel is full.
    pub fn send(&mut self, record: Record) -> Result<(), SourceError> {
        self.sender
            .send(record)
            .map_err(|_| SourceError::Disconnected)?;
        self.sent += 1;
        Ok(())
    }

    /// Send a record without blocking.
    pub fn try_send(&mut self, record: Record) -> Result<(), SourceError> {
        match self.sender.try_send(record) {
            Ok(()) => {
                self.sent += 1;
                Ok(())
            }
            Err(TrySendError::Full(r)) => Err(SourceError::Full(Box::new(r))),
            Err(TrySendError::Disconnected(_)) => Err(SourceError::Disconnected),
        }
    }

    /// Number of records successfully handed off.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Number of records waiting in the channel.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

/// Create a bounded record channel.
pub fn record_channel(capacity: usize) -> (RecordSender, Receiver<Record>) {
    let (sender, receiver) = bounded(capacity.max(1));
    (RecordSender { sender, sent: 0 }, receiver)
}
