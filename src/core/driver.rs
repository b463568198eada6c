//! Per-record entry point of the slicing engine.
//!
//! A [`SlicerSession`] owns the cursor, the builder, the reusable channel
//! buffers and the emitter for one acquisition stream. Records are pushed in
//! order through [`SlicerSession::on_record`]; each call fully consumes or
//! discards its record before returning. Any error is fatal: the session is
//! poisoned and must be replaced.

use crate::config::{AcquisitionConfig, SlicerConfig};
use crate::core::builder::{Advance, SliceBuilder};
use crate::core::cursor::{CursorStatus, ReadCursor, RecordDisposition};
use crate::core::decoder::{ChannelBuffers, RecordDecoder};
use crate::core::header::RunHeader;
use crate::emit::SliceEmitter;
use crate::error::{Result, SlicerError};
use crate::source::Record;
use crate::stats::{create_shared_stats, SessionStatsSnapshot, SharedSessionStats};
use tracing::{debug, error, info};

/// What happened to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Dropped undecoded because no future slice needs its samples
    Skipped,
    /// Decoded and sliced; `slices` were emitted while consuming it
    Consumed { slices: usize },
}

/// One slicing session over one acquisition stream.
pub struct SlicerSession<E: SliceEmitter> {
    header: RunHeader,
    decoder: RecordDecoder,
    buffers: ChannelBuffers,
    cursor: ReadCursor,
    builder: SliceBuilder,
    emitter: E,
    stats: SharedSessionStats,
    last_acquisition: Option<u64>,
    aborted: bool,
    finished: bool,
}

impl<E: SliceEmitter> SlicerSession<E> {
    /// Validate the configuration, announce the run header and build the session.
    pub fn new(slicer: &SlicerConfig, acquisition: &AcquisitionConfig, emitter: E) -> Result<Self> {
        Self::with_stats(slicer, acquisition, emitter, create_shared_stats())
    }

    /// Like [`SlicerSession::new`], counting into caller-provided statistics.
    pub fn with_stats(
        slicer: &SlicerConfig,
        acquisition: &AcquisitionConfig,
        mut emitter: E,
        stats: SharedSessionStats,
    ) -> Result<Self> {
        let header = RunHeader::new(slicer, acquisition).map_err(|e| {
            error!("Rejecting slicing configuration: {e}");
            e
        })?;

        emitter.on_header(&header)?;

        let decoder = RecordDecoder::for_header(&header);
        let buffers = decoder.buffers();
        let cursor = ReadCursor::new(header.geometry.record_length);
        let builder = SliceBuilder::new(header.geometry, header.n_channels);

        info!(
            session = %header.session_id,
            slice_length = header.geometry.slice_length,
            stride = header.geometry.stride,
            record_length = header.geometry.record_length,
            layout = ?header.layout,
            "Slicing session started"
        );

        Ok(Self {
            header,
            decoder,
            buffers,
            cursor,
            builder,
            emitter,
            stats,
            last_acquisition: None,
            aborted: false,
            finished: false,
        })
    }

    /// Consume or discard one record, emitting every slice it completes.
    pub fn on_record(&mut self, record: &Record) -> Result<RecordOutcome> {
        if self.aborted {
            return Err(SlicerError::SessionAborted);
        }
        if self.finished {
            return Err(SlicerError::InvariantViolation(
                "record pushed after the session finished".to_string(),
            ));
        }

        match self.process(record) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(record_id = record.record_id, "Aborting slicing session: {e}");
                self.aborted = true;
                self.builder.invalidate();
                Err(e)
            }
        }
    }

    fn process(&mut self, record: &Record) -> Result<RecordOutcome> {
        self.stats.record_received();
        if self.last_acquisition != Some(record.acquisition_id) {
            self.last_acquisition = Some(record.acquisition_id);
            self.stats.acquisition_started();
        }
        let at_run_start = self.cursor.status() == CursorStatus::AtStartOfRun;

        let disposition = self
            .cursor
            .on_record(record.acquisition_id, self.builder.is_mid_slice())?;
        if disposition == RecordDisposition::Skip {
            debug!(
                record_id = record.record_id,
                remaining = self.cursor.skip_count(),
                "Skipping record"
            );
            self.stats.record_skipped();
            return Ok(RecordOutcome::Skipped);
        }

        if self.cursor.is_new_acquisition() && !at_run_start {
            info!(
                acquisition_id = record.acquisition_id,
                record_offset = self.cursor.absolute_record_offset(),
                "New acquisition"
            );
        }

        self.decoder.decode(record, &mut self.buffers)?;
        self.stats.record_decoded();

        let discarded_before = self.builder.discarded();
        let mut slices = 0;
        while !self.cursor.is_at_end_of_record() {
            match self.builder.advance(&self.buffers, &mut self.cursor)? {
                Advance::NeedMoreData => break,
                Advance::SliceReady(slice) => {
                    self.emitter.emit(slice)?;
                    self.stats.slice_emitted();
                    slices += 1;
                }
            }
        }
        self.stats
            .partial_slices_discarded(self.builder.discarded() - discarded_before);

        // Every record boundary must come with at least one record to advance.
        if self.cursor.is_at_end_of_record() && self.cursor.skip_count() == 0 {
            self.cursor.invalidate();
            return Err(SlicerError::Consistency(format!(
                "reached the end of record {} without an indication to advance records",
                self.cursor.absolute_record_offset()
            )));
        }

        Ok(RecordOutcome::Consumed { slices })
    }

    /// End the session: drop any partial slice and notify the emitter once.
    pub fn finish(&mut self) -> Result<SessionStatsSnapshot> {
        if self.aborted {
            return Err(SlicerError::SessionAborted);
        }
        if !self.finished {
            if self.builder.abandon() {
                debug!(
                    slice = self.builder.slice_number(),
                    bins = self.builder.write_bin(),
                    "Dropping partial slice at end of session"
                );
                self.stats.partial_slices_discarded(1);
            }
            self.finished = true;
            if let Err(e) = self.emitter.on_finish() {
                self.aborted = true;
                return Err(e.into());
            }
            info!(session = %self.header.session_id, "Slicing session finished");
        }
        Ok(self.stats.snapshot())
    }

    pub fn header(&self) -> &RunHeader {
        &self.header
    }

    pub fn cursor(&self) -> &ReadCursor {
        &self.cursor
    }

    pub fn builder(&self) -> &SliceBuilder {
        &self.builder
    }

    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Tear the session down and hand back its emitter.
    pub fn into_emitter(self) -> E {
        self.emitter
    }
}
