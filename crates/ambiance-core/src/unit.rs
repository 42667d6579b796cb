//! The capability interface shared by every node in a graph.
//!
//! A processing unit is split into two halves:
//!
//! - [`ProcessingUnit`]: the audio half. Owned by the render path and called
//!   once per block with `&mut self`. It must not allocate, block, or wait on a
//!   contended lock.
//! - [`UnitControl`]: the control half. Shared (`Send + Sync`) and callable from
//!   any thread for notes, parameters, latency, and transport. Implementations
//!   hand state to the audio half through atomics or lock-free queues.
//!
//! Built-in nodes and hosted units implement the same pair, so the graph treats
//! them uniformly.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ambiance_core::{ProcessError, ProcessingUnit, UnitControl};
//!
//! struct Invert;
//!
//! impl UnitControl for Invert {}
//!
//! struct InvertUnit(Arc<Invert>);
//!
//! impl ProcessingUnit for InvertUnit {
//!     fn process(
//!         &mut self,
//!         left_in: &[f32],
//!         right_in: &[f32],
//!         left_out: &mut [f32],
//!         right_out: &mut [f32],
//!     ) -> Result<(), ProcessError> {
//!         for (o, i) in left_out.iter_mut().zip(left_in) {
//!             *o = -*i;
//!         }
//!         for (o, i) in right_out.iter_mut().zip(right_in) {
//!             *o = -*i;
//!         }
//!         Ok(())
//!     }
//!
//!     fn control(&self) -> Arc<dyn UnitControl> {
//!         self.0.clone()
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::error::{ControlError, ProcessError};
use crate::param::{ParamId, ParamInfo};
use crate::transport::Transport;

/// Audio half of a processing unit.
pub trait ProcessingUnit: Send {
    /// Processes one stereo block.
    ///
    /// All four slices have the same length, which is the frame count. Unconnected
    /// inputs arrive as silence. The output slices are zeroed before the call.
    fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError>;

    /// Returns the control half shared with the rest of the application.
    fn control(&self) -> Arc<dyn UnitControl>;
}

/// Control half of a processing unit.
///
/// Every method has a default, so a unit without notes or parameters needs an
/// empty `impl`.
pub trait UnitControl: Send + Sync {
    /// Delivers a note-on event.
    fn note_on(&self, _channel: u8, _pitch: u8, _velocity: f32) -> Result<(), ControlError> {
        Ok(())
    }

    /// Delivers a note-off event.
    fn note_off(&self, _channel: u8, _pitch: u8, _velocity: f32) -> Result<(), ControlError> {
        Ok(())
    }

    /// Number of automatable parameters.
    fn param_count(&self) -> usize {
        0
    }

    /// Describes the parameter at `index` (not id).
    fn param_info(&self, _index: usize) -> Option<ParamInfo> {
        None
    }

    /// Current normalized value of a parameter, or `None` for an unknown id.
    fn get_param(&self, _id: ParamId) -> Option<f32> {
        None
    }

    /// Sets a parameter from a normalized value.
    fn set_param(&self, id: ParamId, _normalized: f32) -> Result<(), ControlError> {
        Err(ControlError::UnknownParameter(id))
    }

    /// Processing latency in samples. Reported only; the graph never compensates.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Receives the host transport.
    fn set_transport(&self, _transport: &Transport) {}
}
