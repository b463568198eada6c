//! Record Slicer - cuts a digitizer record stream into fixed-length slices.
//!
//! A digitizer delivers samples in fixed-size records. Analysis wants them in
//! slices of a different length, possibly spaced apart by a stride. This crate
//! decodes each record into per-channel sample buffers and copies samples into
//! slices, carrying a slice across record boundaries when needed and skipping
//! records that hold no sample of any future slice.
//!
//! # Guarantees
//!
//! - **Ordered output**: slices are emitted in increasing slice number
//! - **Skips are undecoded**: records between strided slices are never decoded
//! - **Acquisition boundaries**: a slice never mixes samples of two acquisitions
//! - **Fail-stop**: any error poisons the session; nothing is emitted after it
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Record Slicer                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Source    │──▶│   Decoder   │──▶│   Builder   │         │
//! │  │  (records)  │   │ (channels)  │   │  (slices)   │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                 ▲                 │                 │
//! │         ▼                 │                 ▼                 │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Worker    │──▶│   Cursor    │   │   Emitter   │         │
//! │  │  (thread)   │   │ (position)  │   │   (sink)    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use record_slicer::config::{AcquisitionConfig, SlicerConfig, SyntheticSourceConfig};
//! use record_slicer::core::{Slice, SlicerSession};
//! use record_slicer::source::SyntheticSource;
//!
//! let acquisition = AcquisitionConfig::default();
//! let mut slices: Vec<Slice> = Vec::new();
//! let mut session = SlicerSession::new(&SlicerConfig::new(1024, 0), &acquisition, &mut slices)
//!     .expect("valid configuration");
//!
//! for record in SyntheticSource::new(&acquisition, SyntheticSourceConfig::default()) {
//!     session.on_record(&record).expect("record sliced");
//! }
//! session.finish().expect("session finished");
//! ```

pub mod config;
pub mod core;
pub mod emit;
pub mod error;
pub mod source;
pub mod stats;
pub mod worker;

// Re-export key types at crate root for convenience
pub use config::{AcquisitionConfig, Config, OutputMode, SlicerConfig};
pub use core::{RecordOutcome, RunHeader, Slice, SliceHeader, SlicerSession};
pub use emit::{SliceEmitter, SliceEvent};
pub use error::{DecodeError, EmitError, Result, SlicerError};
pub use source::{ChannelLayout, Record};
pub use stats::{SessionStats, SessionStatsSnapshot, SharedSessionStats};
pub use worker::SlicerWorker;

/// Version of the record slicer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
