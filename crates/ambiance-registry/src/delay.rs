//! Stereo feedback delay.

use std::sync::Arc;

use ambiance_core::{
    AtomicF32, ControlError, ParamId, ParamInfo, ParamUnit, ProcessError, ProcessingUnit,
    UnitControl,
};
use libm::{ceilf, roundf};

/// Parameter 0: delay time.
pub const DELAY_TIME: ParamId = ParamId(0);
/// Parameter 1: feedback.
pub const DELAY_FEEDBACK: ParamId = ParamId(1);
/// Parameter 2: wet/dry mix.
pub const DELAY_MIX: ParamId = ParamId(2);

const MIN_TIME_MS: f32 = 1.0;
const MAX_TIME_MS: f32 = 2000.0;
const MAX_FEEDBACK: f32 = 0.95;

/// Control half of [`Delay`].
///
/// ## Parameters
///
/// | Id | Name | Range | Default |
/// |----|------|-------|---------|
/// | 0 | Time | 1–2000 ms | 300 ms |
/// | 1 | Feedback | 0–95% | 40% |
/// | 2 | Mix | 0–100% | 50% |
#[derive(Debug)]
pub struct DelayControl {
    time_ms: AtomicF32,
    feedback: AtomicF32,
    mix: AtomicF32,
}

impl Default for DelayControl {
    fn default() -> Self {
        Self {
            time_ms: AtomicF32::new(300.0),
            feedback: AtomicF32::new(0.4),
            mix: AtomicF32::new(0.5),
        }
    }
}

impl DelayControl {
    /// Delay time in milliseconds.
    pub fn time_ms(&self) -> f32 {
        self.time_ms.load()
    }

    /// Sets the delay time, clamped to 1–2000 ms.
    pub fn set_time_ms(&self, ms: f32) {
        self.time_ms.store(ms.clamp(MIN_TIME_MS, MAX_TIME_MS));
    }

    /// Feedback amount (0–0.95).
    pub fn feedback(&self) -> f32 {
        self.feedback.load()
    }

    /// Sets the feedback amount, clamped to 0–0.95.
    pub fn set_feedback(&self, feedback: f32) {
        self.feedback.store(feedback.clamp(0.0, MAX_FEEDBACK));
    }

    /// Wet/dry mix (0–1).
    pub fn mix(&self) -> f32 {
        self.mix.load()
    }

    /// Sets the wet/dry mix, clamped to 0–1.
    pub fn set_mix(&self, mix: f32) {
        self.mix.store(mix.clamp(0.0, 1.0));
    }
}

impl UnitControl for DelayControl {
    fn param_count(&self) -> usize {
        3
    }

    fn param_info(&self, index: usize) -> Option<ParamInfo> {
        match index {
            0 => Some(ParamInfo::new(DELAY_TIME, "Time", ParamUnit::Milliseconds)),
            1 => Some(ParamInfo::new(DELAY_FEEDBACK, "Feedback", ParamUnit::Percent)),
            2 => Some(ParamInfo::new(DELAY_MIX, "Mix", ParamUnit::Percent)),
            _ => None,
        }
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        match id {
            DELAY_TIME => Some((self.time_ms() - MIN_TIME_MS) / (MAX_TIME_MS - MIN_TIME_MS)),
            DELAY_FEEDBACK => Some(self.feedback() / MAX_FEEDBACK),
            DELAY_MIX => Some(self.mix()),
            _ => None,
        }
    }

    fn set_param(&self, id: ParamId, normalized: f32) -> Result<(), ControlError> {
        if !normalized.is_finite() {
            return Err(ControlError::InvalidValue(normalized));
        }
        let normalized = normalized.clamp(0.0, 1.0);
        match id {
            DELAY_TIME => self.set_time_ms(MIN_TIME_MS + normalized * (MAX_TIME_MS - MIN_TIME_MS)),
            DELAY_FEEDBACK => self.set_feedback(normalized * MAX_FEEDBACK),
            DELAY_MIX => self.set_mix(normalized),
            _ => return Err(ControlError::UnknownParameter(id)),
        }
        Ok(())
    }
}

/// Feedback delay with one integer-sample delay line per channel.
///
/// Delay lines are sized for the maximum time at construction; processing never
/// allocates. The dry path is not delayed, so the unit reports zero latency.
pub struct Delay {
    control: Arc<DelayControl>,
    left: Vec<f32>,
    right: Vec<f32>,
    write: usize,
    sample_rate: f32,
}

impl Delay {
    /// Creates a delay with the default settings.
    pub fn new(sample_rate: f32) -> Self {
        let len = ceilf(MAX_TIME_MS / 1000.0 * sample_rate) as usize + 1;
        Self {
            control: Arc::new(DelayControl::default()),
            left: vec![0.0; len],
            right: vec![0.0; len],
            write: 0,
            sample_rate,
        }
    }

    /// Shared control state.
    pub fn state(&self) -> &Arc<DelayControl> {
        &self.control
    }

    fn delay_samples(&self) -> usize {
        let samples = roundf(self.control.time_ms() / 1000.0 * self.sample_rate) as usize;
        samples.clamp(1, self.left.len() - 1)
    }
}

impl ProcessingUnit for Delay {
    fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        let delay = self.delay_samples();
        let feedback = self.control.feedback();
        let mix = self.control.mix();
        let len = self.left.len();

        for i in 0..left_out.len() {
            let read = (self.write + len - delay) % len;
            let (dry_l, dry_r) = (left_in[i], right_in[i]);
            let (wet_l, wet_r) = (self.left[read], self.right[read]);
            self.left[self.write] = dry_l + wet_l * feedback;
            self.right[self.write] = dry_r + wet_r * feedback;
            left_out[i] = dry_l * (1.0 - mix) + wet_l * mix;
            right_out[i] = dry_r * (1.0 - mix) + wet_r * mix;
            self.write = (self.write + 1) % len;
        }
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.control.clone()
    }
}
