//! Delivery of completed slices to downstream consumers.
//!
//! The slicing session owns one [`SliceEmitter`] and pushes into it
//! synchronously. A consumer that blocks in [`SliceEmitter::emit`] blocks the
//! session with it; there is no queue in between unless the emitter brings
//! one.

pub mod sinks;
pub mod strategy;

use crate::core::{RunHeader, Slice};
use crate::error::EmitError;

// Re-export commonly used types
pub use sinks::{FnEmitter, SliceEvent};
pub use strategy::{emitter_for_mode, Buffered};

/// Receives the run header, every completed slice, and the end-of-run notice.
pub trait SliceEmitter {
    /// Called once at session setup, before any slice.
    fn on_header(&mut self, _header: &RunHeader) -> Result<(), EmitError> {
        Ok(())
    }

    /// Take ownership of a completed slice.
    fn emit(&mut self, slice: Slice) -> Result<(), EmitError>;

    /// Called once when the session finishes normally.
    fn on_finish(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}

impl<E: SliceEmitter + ?Sized> SliceEmitter for &mut E {
    fn on_header(&mut self, header: &RunHeader) -> Result<(), EmitError> {
        (**self).on_header(header)
    }

    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        (**self).emit(slice)
    }

    fn on_finish(&mut self) -> Result<(), EmitError> {
        (**self).on_finish()
    }
}

impl<E: SliceEmitter + ?Sized> SliceEmitter for Box<E> {
    fn on_header(&mut self, header: &RunHeader) -> Result<(), EmitError> {
        (**self).on_header(header)
    }

    fn emit(&mut self, slice: Slice) -> Result<(), EmitError> {
        (**self).emit(slice)
    }

    fn on_finish(&mut self) -> Result<(), EmitError> {
        (**self).on_finish()
    }
}
