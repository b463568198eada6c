//! Error types for the slicing engine.
//!
//! Every error surfaced by a [`SlicerSession`](crate::core::SlicerSession) is
//! fatal for that session. There are no retries here; re-requesting lost
//! records belongs to whoever feeds the session.

use crate::source::ChannelLayout;
use thiserror::Error;

/// Main error type for the slicing engine.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Rejected at session setup, before any record is processed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record could not be unpacked into channel buffers
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The read cursor or slice builder reached an invalid state
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The skip bookkeeping disagrees with the cursor position
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// The downstream consumer refused a slice
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),

    /// A previous fatal error poisoned the session
    #[error("Session aborted after a previous fatal error")]
    SessionAborted,
}

/// Errors raised while unpacking a raw record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported channel layout code {0}")]
    UnsupportedLayout(u8),

    #[error("record layout {found:?} does not match session layout {expected:?}")]
    LayoutMismatch {
        expected: ChannelLayout,
        found: ChannelLayout,
    },

    #[error("record holds {found} bytes, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error(
        "buffers hold {channels} channels of {samples} samples, \
         expected {expected_channels} of {expected_samples}"
    )]
    BufferMismatch {
        expected_channels: usize,
        expected_samples: usize,
        channels: usize,
        samples: usize,
    },
}

/// Errors reported by a [`SliceEmitter`](crate::emit::SliceEmitter).
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("slice consumer disconnected")]
    Disconnected,

    #[error("slice consumer failed: {0}")]
    Consumer(String),
}

/// Convenience Result type using [`SlicerError`].
pub type Result<T> = std::result::Result<T, SlicerError>;
