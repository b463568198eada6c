//! Position of the engine within the incoming record stream.
//!
//! The cursor is advanced once per arriving record by the driver and then
//! sample by sample by the slice builder. It also owns the skip counter: the
//! number of record arrivals still needed before the next useful sample.

use crate::error::{Result, SlicerError};
use serde::{Deserialize, Serialize};

/// Read state of the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorStatus {
    AtStartOfRun,
    AtStartOfRecord,
    ContinueReading,
    ReachedEndOfRecord,
    Invalid,
}

/// What the driver should do with an arriving record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDisposition {
    /// Decode the record and hand it to the slice builder
    Consume,
    /// Drop the record undecoded; it holds no sample of any future slice
    Skip,
}

/// Bookkeeping of where the engine is in the record stream.
#[derive(Debug, Clone)]
pub struct ReadCursor {
    record_length: usize,
    absolute_record_offset: u64,
    offset_in_record: usize,
    slice_start_offset_in_record: usize,
    record_offset_since_slice_start: u32,
    acquisition_id: u64,
    is_new_acquisition: bool,
    skip_count: u32,
    status: CursorStatus,
}

impl ReadCursor {
    pub fn new(record_length: usize) -> Self {
        Self {
            record_length,
            absolute_record_offset: 0,
            offset_in_record: 0,
            slice_start_offset_in_record: 0,
            record_offset_since_slice_start: 0,
            acquisition_id: 0,
            is_new_acquisition: false,
            skip_count: 0,
            status: CursorStatus::AtStartOfRun,
        }
    }

    /// Apply the per-record transition for a newly arrived record.
    ///
    /// `mid_slice` tells whether the slice builder has a partially filled
    /// slice waiting for this record.
    pub fn on_record(&mut self, acquisition_id: u64, mid_slice: bool) -> Result<RecordDisposition> {
        match self.status {
            CursorStatus::AtStartOfRun => {
                self.absolute_record_offset = 0;
                self.offset_in_record = 0;
                self.slice_start_offset_in_record = 0;
                self.record_offset_since_slice_start = 0;
                self.skip_count = 0;
                self.acquisition_id = acquisition_id;
                self.is_new_acquisition = true;
                self.status = CursorStatus::AtStartOfRecord;
                Ok(RecordDisposition::Consume)
            }
            CursorStatus::ReachedEndOfRecord => {
                self.absolute_record_offset += 1;
                if mid_slice {
                    self.record_offset_since_slice_start += 1;
                }

                self.skip_count = self.skip_count.saturating_sub(1);
                if self.skip_count != 0 {
                    return Ok(RecordDisposition::Skip);
                }

                // Checked only once skipping is over, so a change that happened
                // inside the skipped records is still seen here.
                if self.acquisition_id != acquisition_id {
                    self.acquisition_id = acquisition_id;
                    self.is_new_acquisition = true;
                } else {
                    self.is_new_acquisition = false;
                }

                if mid_slice {
                    self.offset_in_record = 0;
                }
                self.status = CursorStatus::AtStartOfRecord;
                Ok(RecordDisposition::Consume)
            }
            CursorStatus::AtStartOfRecord | CursorStatus::ContinueReading => {
                let previous = self.status;
                self.status = CursorStatus::Invalid;
                Err(SlicerError::InvariantViolation(format!(
                    "new record arrived while the cursor was {:?} at sample {} of {}",
                    previous, self.offset_in_record, self.record_length
                )))
            }
            CursorStatus::Invalid => Err(SlicerError::InvariantViolation(
                "read cursor is invalid".to_string(),
            )),
        }
    }

    /// Mark the start of a new slice at the current read position.
    pub(crate) fn start_slice(&mut self) {
        self.status = CursorStatus::ContinueReading;
        self.is_new_acquisition = false;
    }

    /// Begin consuming the current record, if not already doing so.
    pub(crate) fn begin_reading(&mut self) {
        if self.status == CursorStatus::AtStartOfRecord {
            self.status = CursorStatus::ContinueReading;
        }
    }

    /// Restart slice bookkeeping at the first sample of the current record.
    pub(crate) fn restart_at_record_start(&mut self) {
        self.offset_in_record = 0;
        self.slice_start_offset_in_record = 0;
        self.record_offset_since_slice_start = 0;
    }

    /// Step past the sample at the read position.
    pub(crate) fn step(&mut self) {
        self.offset_in_record += 1;
        if self.offset_in_record >= self.record_length {
            self.status = CursorStatus::ReachedEndOfRecord;
        }
    }

    /// Ask for exactly one more record before reading can resume.
    pub(crate) fn request_next_record(&mut self) {
        self.skip_count = 1;
    }

    /// Move the slice start forward by `stride` samples and position the read
    /// pointer there. Returns the number of record arrivals needed first.
    pub(crate) fn advance_slice_start(&mut self, stride: usize) -> Result<u32> {
        let record_length = self.record_length as u64;
        let stride = stride as u64;
        let start = (self.slice_start_offset_in_record as u64)
            .checked_add(stride % record_length)
            .ok_or_else(|| {
                SlicerError::InvariantViolation("slice start offset overflowed".to_string())
            })?;

        let records = (stride / record_length)
            .checked_add(start / record_length)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                self.status = CursorStatus::Invalid;
                SlicerError::InvariantViolation(format!(
                    "stride of {stride} samples spans more records than the skip counter holds"
                ))
            })?;
        self.slice_start_offset_in_record = (start % record_length) as usize;

        self.skip_count = records.saturating_sub(self.record_offset_since_slice_start);
        if self.skip_count > 0 {
            self.status = CursorStatus::ReachedEndOfRecord;
        }

        self.record_offset_since_slice_start = 0;
        self.offset_in_record = self.slice_start_offset_in_record;
        Ok(self.skip_count)
    }

    pub(crate) fn invalidate(&mut self) {
        self.status = CursorStatus::Invalid;
    }

    pub fn status(&self) -> CursorStatus {
        self.status
    }

    pub fn is_at_end_of_record(&self) -> bool {
        self.status == CursorStatus::ReachedEndOfRecord
    }

    pub fn absolute_record_offset(&self) -> u64 {
        self.absolute_record_offset
    }

    pub fn offset_in_record(&self) -> usize {
        self.offset_in_record
    }

    pub fn slice_start_offset_in_record(&self) -> usize {
        self.slice_start_offset_in_record
    }

    pub fn record_offset_since_slice_start(&self) -> u32 {
        self.record_offset_since_slice_start
    }

    pub fn acquisition_id(&self) -> u64 {
        self.acquisition_id
    }

    pub fn is_new_acquisition(&self) -> bool {
        self.is_new_acquisition
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn record_length(&self) -> usize {
        self.record_length
    }
}
