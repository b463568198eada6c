//! Record sources feeding the slicing engine.
//!
//! This module provides:
//! - The raw [`Record`] type and its [`ChannelLayout`]
//! - A bounded channel for handing records to a worker thread
//! - A synthetic source for demos and tests

pub mod channel;
pub mod synthetic;
pub mod types;

// Re-export commonly used types
pub use channel::{record_channel, RecordSender, SourceError};
pub use synthetic::{encode_record, SyntheticSource};
pub use types::{ChannelLayout, Record};
