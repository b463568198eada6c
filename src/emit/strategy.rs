//! Output strategy, picked once from [`OutputMode`] when the session is set up.

use crate::config::OutputMode;
use crate::core::{RunHeader, Slice};
use crate::emit::SliceEmitter;
use crate::error::EmitError;

/// Holds every slice until the session finishes, then forwards them in order.
pub struct Buffered<S> {
    sink: S,
    held: Vec<Slice>,
}

impl<S: SliceEmitter> Buffered<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            held: Vec::new(),
        }
    }

    /// Number of slices waiting for the finish notice.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: SliceEmitter> SliceEmitter for Buffered<S> {
    fn on_header(&mut self, header: &RunHeader) -> Result<(), EmitError> {
        self.sink.on_header(header)
    }

    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        self.held.push(slice);
        Ok(())
    }

    fn on_finish(&mut self) -> Result<(), EmitError> {
        for slice in self.held.drain(..) {
            self.sink.emit(slice)?;
        }
        self.sink.on_finish()
    }
}

/// Wrap `sink` according to the configured output mode.
pub fn emitter_for_mode<S>(mode: OutputMode, sink: S) -> Box<dyn SliceEmitter + Send>
where
    S: SliceEmitter + Send + 'static,
{
    match mode {
        OutputMode::Stream => Box::new(sink),
        OutputMode::Buffer => Box::new(Buffered::new(sink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slice::SliceHeader;
    use crate::emit::SliceEvent;
    use crossbeam_channel::unbounded;

    fn slice(number: u64) -> Slice {
        let header = SliceHeader {
            slice_number: number,
            n_channels: 1,
            is_new_acquisition: false,
            sample_rate_hz: 1.0,
            slice_length: 1,
            record_length: 1,
            non_overlap_fraction: 1.0,
            time_in_run: 0.0,
            start_record_number: 0,
            start_sample_number: 0,
            end_record_number: 0,
            end_sample_number: 0,
            channels: Vec::new(),
        };
        Slice::new(header, vec![vec![0]])
    }

    #[test]
    fn test_buffered_holds_until_finish() {
        let mut buffered = Buffered::new(Vec::<Slice>::new());
        buffered.emit(slice(0)).unwrap();
        buffered.emit(slice(1)).unwrap();
        assert_eq!(buffered.held(), 2);

        buffered.on_finish().unwrap();
        assert_eq!(buffered.held(), 0);
        let sink = buffered.into_inner();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].slice_number(), 0);
    }

    #[test]
    fn test_stream_mode_forwards_immediately() {
        let (tx, rx) = unbounded::<SliceEvent>();
        let mut emitter = emitter_for_mode(OutputMode::Stream, tx);
        emitter.emit(slice(5)).unwrap();
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_buffer_mode_defers() {
        let (tx, rx) = unbounded::<SliceEvent>();
        let mut emitter = emitter_for_mode(OutputMode::Buffer, tx);
        emitter.emit(slice(5)).unwrap();
        assert_eq!(rx.len(), 0);
        emitter.on_finish().unwrap();
        let events: Vec<SliceEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SliceEvent::Finished));
    }
}
