//! Accumulates decoded samples into outgoing slices.
//!
//! The builder copies samples from the current record's channel buffers into
//! the slice in progress, one bin at a time, until either the slice is full or
//! the record runs out. A completed slice is handed back to the caller, and
//! the cursor is moved to where the next slice starts.

use crate::core::cursor::ReadCursor;
use crate::core::decoder::ChannelBuffers;
use crate::core::header::SliceGeometry;
use crate::core::slice::{Slice, SliceHeader};
use crate::error::{Result, SlicerError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SEC_PER_NSEC: f64 = 1.0e-9;

/// Write state of the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuilderStatus {
    AtStartOfRun,
    AtStartOfSlice,
    MidSlice,
    SliceComplete,
    Invalid,
}

/// Result of one [`SliceBuilder::advance`] call.
#[derive(Debug)]
pub enum Advance {
    /// The current record is exhausted; progress resumes with a later record
    NeedMoreData,
    /// A slice was completed and ownership passes to the caller
    SliceReady(Slice),
}

#[derive(Debug)]
struct PendingSlice {
    header: SliceHeader,
    samples: Vec<Vec<u64>>,
}

/// Bookkeeping of the slice being built.
#[derive(Debug)]
pub struct SliceBuilder {
    geometry: SliceGeometry,
    n_channels: usize,
    write_bin: usize,
    slice_number: u64,
    status: BuilderStatus,
    pending: Option<PendingSlice>,
    discarded: u64,
}

impl SliceBuilder {
    pub fn new(geometry: SliceGeometry, n_channels: usize) -> Self {
        Self {
            geometry,
            n_channels,
            write_bin: 0,
            slice_number: 0,
            status: BuilderStatus::AtStartOfRun,
            pending: None,
            discarded: 0,
        }
    }

    /// Copy samples from `buffers` until a slice completes or the record is exhausted.
    pub fn advance(&mut self, buffers: &ChannelBuffers, cursor: &mut ReadCursor) -> Result<Advance> {
        match self.status {
            BuilderStatus::AtStartOfRun => {
                self.slice_number = 0;
                self.status = BuilderStatus::AtStartOfSlice;
                self.begin_slice(buffers, cursor);
            }
            BuilderStatus::AtStartOfSlice => self.begin_slice(buffers, cursor),
            BuilderStatus::SliceComplete => {
                if cursor.is_at_end_of_record() {
                    // next slice starts in a later record
                    return Ok(Advance::NeedMoreData);
                }
                self.slice_number += 1;
                self.begin_slice(buffers, cursor);
            }
            BuilderStatus::MidSlice if cursor.is_new_acquisition() => {
                warn!(
                    "Acquisition changed to {} mid-slice; discarding slice {} after {} of {} bins",
                    cursor.acquisition_id(),
                    self.slice_number,
                    self.write_bin,
                    self.geometry.slice_length
                );
                self.pending = None;
                self.discarded += 1;
                self.slice_number += 1;
                cursor.restart_at_record_start();
                self.begin_slice(buffers, cursor);
            }
            BuilderStatus::MidSlice => cursor.begin_reading(),
            BuilderStatus::Invalid => {
                return Err(SlicerError::InvariantViolation(
                    "slice builder is invalid".to_string(),
                ))
            }
        }

        let Some(mut pending) = self.pending.take() else {
            self.status = BuilderStatus::Invalid;
            cursor.invalidate();
            return Err(SlicerError::InvariantViolation(format!(
                "slice {} is in progress but has no sample buffers",
                self.slice_number
            )));
        };

        while self.write_bin < self.geometry.slice_length {
            if cursor.is_at_end_of_record() {
                debug!("Returning for new record, mid-slice");
                cursor.request_next_record();
                self.pending = Some(pending);
                return Ok(Advance::NeedMoreData);
            }

            let offset = cursor.offset_in_record();
            for (out, channel) in pending.samples.iter_mut().zip(buffers.channels()) {
                out[self.write_bin] = channel[offset];
            }

            cursor.step();
            self.write_bin += 1;
        }

        self.status = BuilderStatus::SliceComplete;
        pending.header.end_record_number = cursor.absolute_record_offset();
        pending.header.end_sample_number = cursor.offset_in_record() - 1;

        let records_to_skip = cursor.advance_slice_start(self.geometry.stride)?;
        debug!(
            slice = pending.header.slice_number,
            records_to_skip,
            next_start = cursor.slice_start_offset_in_record(),
            "Slice complete"
        );

        Ok(Advance::SliceReady(Slice::new(pending.header, pending.samples)))
    }

    fn begin_slice(&mut self, buffers: &ChannelBuffers, cursor: &mut ReadCursor) {
        let info = buffers.info();
        let offset = cursor.offset_in_record();
        let bin_width = self.geometry.bin_width();

        let header = SliceHeader {
            slice_number: self.slice_number,
            n_channels: self.n_channels,
            is_new_acquisition: cursor.is_new_acquisition(),
            sample_rate_hz: self.geometry.sample_rate_hz,
            slice_length: self.geometry.slice_length,
            record_length: self.geometry.record_length,
            non_overlap_fraction: self.geometry.non_overlap_fraction(),
            time_in_run: info.timestamp_ns as f64 * SEC_PER_NSEC + bin_width * offset as f64,
            start_record_number: cursor.absolute_record_offset(),
            start_sample_number: offset,
            end_record_number: 0,
            end_sample_number: 0,
            channels: vec![info; self.n_channels],
        };

        debug!(
            "Time in run: {} s\n\tBin width = {}\n\tRecord size = {}\n\tRecord offset = {}\n\tSlice start offset = {}\n\tRecord offset since slice start = {}\n\tRead offset = {}",
            header.time_in_run,
            bin_width,
            self.geometry.record_length,
            cursor.absolute_record_offset(),
            cursor.slice_start_offset_in_record(),
            cursor.record_offset_since_slice_start(),
            offset
        );

        self.pending = Some(PendingSlice {
            header,
            samples: vec![vec![0; self.geometry.slice_length]; self.n_channels],
        });
        cursor.start_slice();
        self.write_bin = 0;
        self.status = BuilderStatus::MidSlice;
    }

    /// Drop the slice in progress, if any. Returns whether one was dropped.
    pub fn abandon(&mut self) -> bool {
        let dropped = self.pending.take().is_some();
        if dropped {
            self.discarded += 1;
        }
        dropped
    }

    pub(crate) fn invalidate(&mut self) {
        self.status = BuilderStatus::Invalid;
    }

    pub fn status(&self) -> BuilderStatus {
        self.status
    }

    pub fn is_mid_slice(&self) -> bool {
        self.status == BuilderStatus::MidSlice
    }

    pub fn slice_number(&self) -> u64 {
        self.slice_number
    }

    pub fn write_bin(&self) -> usize {
        self.write_bin
    }

    /// Partial slices dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
