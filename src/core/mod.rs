//! Core slicing engine.
//!
//! This module contains:
//! - Run header and slice geometry validation
//! - Record decoding into per-channel buffers
//! - The read cursor and slice builder state machines
//! - The per-record session driver

pub mod builder;
pub mod cursor;
pub mod decoder;
pub mod driver;
pub mod header;
pub mod slice;

// Re-export commonly used types
pub use builder::{Advance, BuilderStatus, SliceBuilder};
pub use cursor::{CursorStatus, ReadCursor, RecordDisposition};
pub use decoder::{ChannelBuffers, RecordDecoder};
pub use driver::{RecordOutcome, SlicerSession};
pub use header::{DigitizerParams, RunHeader, SliceGeometry, SUPPORTED_SAMPLE_WIDTHS};
pub use slice::{ChannelInfo, ChannelSummary, Slice, SliceHeader};
