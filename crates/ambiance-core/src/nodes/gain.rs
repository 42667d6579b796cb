//! Scalar gain stage with one automatable parameter.

use std::sync::Arc;

use crate::error::{ControlError, ProcessError};
use crate::math::{db_to_linear, db_to_normalized, normalized_to_db};
use crate::param::{AtomicF32, ParamId, ParamInfo, ParamUnit};
use crate::unit::{ProcessingUnit, UnitControl};

/// Id of the gain node's only parameter.
pub const GAIN_PARAM: ParamId = ParamId(0);

/// Shared gain level in dB.
///
/// Exposes parameter [`GAIN_PARAM`] ("Output Gain"), mapped linearly from
/// `[0, 1]` to `[-60 dB, 0 dB]`. Any other id is rejected.
#[derive(Debug)]
pub struct GainState {
    db: AtomicF32,
}

impl GainState {
    /// Current level in dB.
    pub fn db(&self) -> f32 {
        self.db.load()
    }

    /// Sets the level in dB, bypassing the normalized mapping.
    pub fn set_db(&self, db: f32) {
        self.db.store(db);
    }
}

impl UnitControl for GainState {
    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamInfo> {
        (index == 0).then(|| ParamInfo::new(GAIN_PARAM, "Output Gain", ParamUnit::Decibels))
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        (id == GAIN_PARAM).then(|| db_to_normalized(self.db.load()))
    }

    fn set_param(&self, id: ParamId, normalized: f32) -> Result<(), ControlError> {
        if id != GAIN_PARAM {
            return Err(ControlError::UnknownParameter(id));
        }
        if !normalized.is_finite() {
            return Err(ControlError::InvalidValue(normalized));
        }
        self.db.store(normalized_to_db(normalized));
        Ok(())
    }
}

/// Multiplies its input by `10^(dB/20)`.
///
/// The level is read once per block, so a change lands on the next block
/// boundary.
#[derive(Debug, Clone)]
pub struct Gain {
    state: Arc<GainState>,
}

impl Gain {
    /// Creates a gain stage at `db`.
    ///
    /// The initial level is not clamped; only the normalized parameter mapping
    /// is limited to `[-60 dB, 0 dB]`.
    pub fn new(db: f32) -> Self {
        Self {
            state: Arc::new(GainState {
                db: AtomicF32::new(db),
            }),
        }
    }

    /// Shared state, also reachable from the control half.
    pub fn state(&self) -> &Arc<GainState> {
        &self.state
    }
}

impl ProcessingUnit for Gain {
    fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        let gain = db_to_linear(self.state.db.load());
        for (out, &input) in left_out.iter_mut().zip(left_in) {
            *out = input * gain;
        }
        for (out, &input) in right_out.iter_mut().zip(right_in) {
            *out = input * gain;
        }
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.state.clone()
    }
}
