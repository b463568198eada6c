//! Stock slice emitters.

use crate::core::{RunHeader, Slice};
use crate::emit::SliceEmitter;
use crate::error::EmitError;
use crossbeam_channel::Sender;

/// Collect slices in memory. The header and finish notice are ignored.
impl SliceEmitter for Vec<Slice> {
    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        self.push(slice);
        Ok(())
    }
}

/// Everything a session hands out, as one message type for channel delivery.
#[derive(Debug, Clone)]
pub enum SliceEvent {
    Header(Box<RunHeader>),
    Slice(Slice),
    Finished,
}

/// Forward session output over a crossbeam channel.
impl SliceEmitter for Sender<SliceEvent> {
    fn on_header(&mut self, header: &RunHeader) -> Result<(), EmitError> {
        self.send(SliceEvent::Header(Box::new(header.clone())))
            .map_err(|_| EmitError::Disconnected)
    }

    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        self.send(SliceEvent::Slice(slice))
            .map_err(|_| EmitError::Disconnected)
    }

    fn on_finish(&mut self) -> Result<(), EmitError> {
        self.send(SliceEvent::Finished)
            .map_err(|_| EmitError::Disconnected)
    }
}

/// Adapt a closure into an emitter.
pub struct FnEmitter<F>(pub F);

impl<F> SliceEmitter for FnEmitter<F>
where
    F: FnMut(Slice) -> Result<(), EmitError>,
{
    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        (self.0)(slice)
    }
}
