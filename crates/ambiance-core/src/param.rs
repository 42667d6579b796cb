//! Parameter metadata and lock-free parameter storage.
//!
//! Every node exposes its automatable parameters through
//! [`UnitControl`](crate::UnitControl): a count, a [`ParamInfo`] per index, and
//! get/set by [`ParamId`] with values normalized to `[0, 1]`. Ids are scoped to
//! the node that declares them; two nodes may both expose id `0`.
//!
//! [`AtomicF32`] is the storage the built-in nodes use so that parameter writes
//! from a control thread and reads from the audio thread never contend on a lock.

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier of a parameter, scoped to one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub u32);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "param {}", self.0)
    }
}

impl From<u32> for ParamId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Physical unit a parameter's normalized value maps onto.
///
/// Hosted units report arbitrary unit labels; those land in
/// [`ParamUnit::Custom`].
///
/// # Example
///
/// ```rust
/// use ambiance_core::ParamUnit;
///
/// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
/// assert_eq!(ParamUnit::from_label("dB"), ParamUnit::Decibels);
/// assert_eq!(ParamUnit::from_label("st").suffix(), " st");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Dimensionless.
    None,
    /// Any other unit, as labelled by the hosted unit.
    Custom(String),
}

impl ParamUnit {
    /// Parses a unit label as reported by a hosted unit.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "dB" | "db" => Self::Decibels,
            "Hz" | "hz" => Self::Hertz,
            "ms" => Self::Milliseconds,
            "%" => Self::Percent,
            "" => Self::None,
            other => Self::Custom(other.to_owned()),
        }
    }

    /// Returns the short label, e.g. `"dB"`.
    pub fn label(&self) -> &str {
        match self {
            Self::Decibels => "dB",
            Self::Hertz => "Hz",
            Self::Milliseconds => "ms",
            Self::Percent => "%",
            Self::None => "",
            Self::Custom(label) => label,
        }
    }

    /// Returns the suffix used when displaying a value, e.g. `" dB"`.
    pub fn suffix(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Percent => "%".to_owned(),
            other => format!(" {}", other.label()),
        }
    }
}

/// Describes one parameter of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    /// Node-scoped identifier used with get/set.
    pub id: ParamId,
    /// Display name, e.g. `"Output Gain"`.
    pub name: String,
    /// Physical unit of the mapped value.
    pub unit: ParamUnit,
}

impl ParamInfo {
    /// Creates a parameter description.
    pub fn new(id: impl Into<ParamId>, name: impl Into<String>, unit: ParamUnit) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit,
        }
    }
}

/// An `f32` that can be shared between threads without locking.
///
/// Stored as raw bits in an [`AtomicU32`]. Relaxed ordering is enough: each value
/// is independent and readers only need to eventually observe the latest write.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Creates a new atomic holding `value`.
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Reads the current value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replaces the current value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}
