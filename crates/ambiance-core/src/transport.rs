//! Host transport state forwarded to hosted units.

use serde::{Deserialize, Serialize};

/// Musical position and tempo reported by the host.
///
/// The graph stores the most recent value and forwards it to every node; it
/// never advances the position itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transport {
    /// Tempo in beats per minute.
    pub tempo_bpm: f64,
    /// Time signature numerator.
    pub time_sig_numerator: u32,
    /// Time signature denominator.
    pub time_sig_denominator: u32,
    /// Position in quarter notes since the start of the timeline.
    pub ppq_position: f64,
    /// Whether the host transport is running.
    pub playing: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            time_sig_numerator: 4,
            time_sig_denominator: 4,
            ppq_position: 0.0,
            playing: false,
        }
    }
}

impl Transport {
    /// Length of one beat in samples at the given sample rate.
    pub fn samples_per_beat(&self, sample_rate: f32) -> f64 {
        if self.tempo_bpm <= 0.0 {
            return 0.0;
        }
        f64::from(sample_rate) * 60.0 / self.tempo_bpm
    }
}
