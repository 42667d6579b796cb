//! Level conversions used by the gain stages and the normalized parameter mapping.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`normalized_to_db`] / [`db_to_normalized`] - The `[0, 1]` ↔ `[-60 dB, 0 dB]`
//!   mapping exposed by the built-in Gain node

use libm::{expf, logf};

/// Lowest level reachable through the normalized gain mapping.
pub const GAIN_FLOOR_DB: f32 = -60.0;

/// Highest level reachable through the normalized gain mapping.
pub const GAIN_CEILING_DB: f32 = 0.0;

const GAIN_RANGE_DB: f32 = GAIN_CEILING_DB - GAIN_FLOOR_DB;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use ambiance_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are floored to -200 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Map a normalized value in `[0, 1]` to `[-60 dB, 0 dB]`.
///
/// The input is clamped first.
#[inline]
pub fn normalized_to_db(normalized: f32) -> f32 {
    normalized.clamp(0.0, 1.0) * GAIN_RANGE_DB + GAIN_FLOOR_DB
}

/// Map a level in dB onto the normalized `[0, 1]` range.
///
/// Levels outside `[-60 dB, 0 dB]` saturate at the range ends.
#[inline]
pub fn db_to_normalized(db: f32) -> f32 {
    ((db - GAIN_FLOOR_DB) / GAIN_RANGE_DB).clamp(0.0, 1.0)
}
