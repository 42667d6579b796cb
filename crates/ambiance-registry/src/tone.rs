//! Note-driven tone generator.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use ambiance_core::{
    AtomicF32, ControlError, ParamId, ParamInfo, ParamUnit, ProcessError, ProcessingUnit,
    UnitControl, db_to_linear, db_to_normalized, normalized_to_db,
};
use libm::{floorf, powf, sinf};

/// Parameter 0: output level.
pub const TONE_LEVEL: ParamId = ParamId(0);
/// Parameter 1: detune.
pub const TONE_DETUNE: ParamId = ParamId(1);

/// Detune range in cents, either side of the played note.
const DETUNE_RANGE_CENTS: f32 = 100.0;

/// No note is held.
const GATE_CLOSED: u32 = u32::MAX;

/// Oscillator waveform, selected by the unit variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// Pure sine.
    Sine,
    /// Naive square, ±1.
    Square,
}

impl Waveform {
    /// Parses a variant selector. `None` selects [`Waveform::Sine`].
    pub fn from_variant(variant: Option<&str>) -> Option<Self> {
        match variant {
            None | Some("sine") => Some(Self::Sine),
            Some("square") => Some(Self::Square),
            Some(_) => None,
        }
    }

    #[inline]
    fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => sinf(phase * TAU),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Control half of [`Tone`]: held note, velocity, and parameters.
///
/// ## Parameters
///
/// | Id | Name | Range | Default |
/// |----|------|-------|---------|
/// | 0 | Level | -60–0 dB | -12 dB |
/// | 1 | Detune | ±100 cents | 0 |
#[derive(Debug)]
pub struct ToneControl {
    /// Held pitch, or [`GATE_CLOSED`].
    note: AtomicU32,
    velocity: AtomicF32,
    level_db: AtomicF32,
    detune_cents: AtomicF32,
}

impl Default for ToneControl {
    fn default() -> Self {
        Self {
            note: AtomicU32::new(GATE_CLOSED),
            velocity: AtomicF32::new(0.0),
            level_db: AtomicF32::new(-12.0),
            detune_cents: AtomicF32::new(0.0),
        }
    }
}

impl ToneControl {
    /// Currently held pitch.
    pub fn held_note(&self) -> Option<u8> {
        u8::try_from(self.note.load(Ordering::Relaxed)).ok()
    }

    /// Level in dB.
    pub fn level_db(&self) -> f32 {
        self.level_db.load()
    }

    /// Detune in cents.
    pub fn detune_cents(&self) -> f32 {
        self.detune_cents.load()
    }
}

impl UnitControl for ToneControl {
    fn note_on(&self, _channel: u8, pitch: u8, velocity: f32) -> Result<(), ControlError> {
        self.velocity.store(velocity);
        self.note.store(u32::from(pitch), Ordering::Relaxed);
        Ok(())
    }

    fn note_off(&self, _channel: u8, pitch: u8, _velocity: f32) -> Result<(), ControlError> {
        // Only the held note releases the gate.
        let _ = self.note.compare_exchange(
            u32::from(pitch),
            GATE_CLOSED,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        Ok(())
    }

    fn param_count(&self) -> usize {
        2
    }

    fn param_info(&self, index: usize) -> Option<ParamInfo> {
        match index {
            0 => Some(ParamInfo::new(TONE_LEVEL, "Level", ParamUnit::Decibels)),
            1 => Some(ParamInfo::new(
                TONE_DETUNE,
                "Detune",
                ParamUnit::Custom("ct".to_owned()),
            )),
            _ => None,
        }
    }

    fn get_param(&self, id: ParamId) -> Option<f32> {
        match id {
            TONE_LEVEL => Some(db_to_normalized(self.level_db.load())),
            TONE_DETUNE => {
                Some((self.detune_cents.load() / DETUNE_RANGE_CENTS + 1.0) * 0.5)
            }
            _ => None,
        }
    }

    fn set_param(&self, id: ParamId, normalized: f32) -> Result<(), ControlError> {
        if !normalized.is_finite() {
            return Err(ControlError::InvalidValue(normalized));
        }
        let normalized = normalized.clamp(0.0, 1.0);
        match id {
            TONE_LEVEL => self.level_db.store(normalized_to_db(normalized)),
            TONE_DETUNE => self
                .detune_cents
                .store((normalized * 2.0 - 1.0) * DETUNE_RANGE_CENTS),
            _ => return Err(ControlError::UnknownParameter(id)),
        }
        Ok(())
    }
}

/// Monophonic oscillator played by note events. Ignores its input.
///
/// The most recent note-on sets the pitch; a note-off for that pitch silences
/// it. Output amplitude is `velocity * level`.
pub struct Tone {
    control: Arc<ToneControl>,
    waveform: Waveform,
    sample_rate: f32,
    phase: f32,
}

impl Tone {
    /// Creates a silent tone generator.
    pub fn new(sample_rate: f32, waveform: Waveform) -> Self {
        Self {
            control: Arc::new(ToneControl::default()),
            waveform,
            sample_rate,
            phase: 0.0,
        }
    }

    /// Shared control state.
    pub fn state(&self) -> &Arc<ToneControl> {
        &self.control
    }

    fn frequency(&self, pitch: u8) -> f32 {
        let semitones = f32::from(pitch) - 69.0 + self.control.detune_cents() / 100.0;
        440.0 * powf(2.0, semitones / 12.0)
    }
}

impl ProcessingUnit for Tone {
    fn process(
        &mut self,
        _left_in: &[f32],
        _right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        let Some(pitch) = self.control.held_note() else {
            left_out.fill(0.0);
            right_out.fill(0.0);
            return Ok(());
        };

        let amplitude = self.control.velocity.load() * db_to_linear(self.control.level_db());
        let increment = self.frequency(pitch) / self.sample_rate;
        for (left, right) in left_out.iter_mut().zip(right_out.iter_mut()) {
            let sample = self.waveform.sample(self.phase) * amplitude;
            *left = sample;
            *right = sample;
            self.phase += increment;
            // The increment exceeds one cycle when the note is above the sample rate.
            self.phase -= floorf(self.phase);
        }
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.control.clone()
    }
}
