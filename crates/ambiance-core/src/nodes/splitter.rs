//! Identity pass-through node.

use std::sync::Arc;

use crate::error::ProcessError;
use crate::unit::{ProcessingUnit, UnitControl};

/// Copies its input to its output. Stateless, no parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Splitter;

impl UnitControl for Splitter {}

impl ProcessingUnit for Splitter {
    fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        left_out.copy_from_slice(left_in);
        right_out.copy_from_slice(right_in);
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        Arc::new(Splitter)
    }
}
