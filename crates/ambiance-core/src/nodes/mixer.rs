//! N-to-1 summing mixer with per-slot gain.

use std::sync::Arc;

use crate::error::ProcessError;
use crate::param::AtomicF32;
use crate::unit::{ProcessingUnit, UnitControl};

/// Per-slot linear gains shared between the control and audio halves.
#[derive(Debug)]
pub struct MixerState {
    gains: Box<[AtomicF32]>,
}

impl MixerState {
    /// Number of input slots.
    pub fn inputs(&self) -> usize {
        self.gains.len()
    }

    /// Linear gain of `slot`, or `None` if out of range.
    pub fn gain(&self, slot: usize) -> Option<f32> {
        self.gains.get(slot).map(AtomicF32::load)
    }

    /// Sets the linear gain of `slot`. Returns `false` if out of range.
    pub fn set_gain(&self, slot: usize, gain: f32) -> bool {
        match self.gains.get(slot) {
            Some(cell) => {
                cell.store(gain);
                true
            }
            None => false,
        }
    }
}

impl UnitControl for MixerState {}

/// Sums its input slots, each scaled by its own gain (unity by default).
///
/// Inside a graph only slot 0 is fed, by the node's single incoming edge; the
/// remaining slots are silent. [`Mixer::mix`] accepts any number of slots for
/// direct use.
#[derive(Debug, Clone)]
pub struct Mixer {
    state: Arc<MixerState>,
}

impl Mixer {
    /// Creates a mixer with `inputs` slots.
    ///
    /// Callers validate `inputs > 0`; the graph rejects zero before getting here.
    pub fn new(inputs: usize) -> Self {
        let gains = (0..inputs).map(|_| AtomicF32::new(1.0)).collect();
        Self {
            state: Arc::new(MixerState { gains }),
        }
    }

    /// Shared state, also reachable from the control half.
    pub fn state(&self) -> &Arc<MixerState> {
        &self.state
    }

    /// Zeroes the output and accumulates `inputs[i] * gain[i]`.
    ///
    /// Inputs beyond the slot count are ignored; missing slots are silent.
    pub fn mix(&self, inputs: &[(&[f32], &[f32])], left_out: &mut [f32], right_out: &mut [f32]) {
        left_out.fill(0.0);
        right_out.fill(0.0);
        for (&(left_in, right_in), cell) in inputs.iter().zip(self.state.gains.iter()) {
            let gain = cell.load();
            for (out, &input) in left_out.iter_mut().zip(left_in) {
                *out += input * gain;
            }
            for (out, &input) in right_out.iter_mut().zip(right_in) {
                *out += input * gain;
            }
        }
    }
}

impl ProcessingUnit for Mixer {
    fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        self.mix(&[(left_in, right_in)], left_out, right_out);
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.state.clone()
    }
}
