//! Node variants hosted by a [`Graph`](crate::Graph).
//!
//! Four variants: a hosted external unit, [`Mixer`], [`Splitter`], and
//! [`Gain`]. The graph stores each node as a pair of sum types,
//! `NodeProcessor` (audio half) and `NodeControl` (control half), and dispatches
//! with a `match`. Built-ins are stored inline; only external units sit behind a
//! `Box`.

mod gain;
mod mixer;
mod splitter;

pub use gain::{GAIN_PARAM, Gain, GainState};
pub use mixer::{Mixer, MixerState};
pub use splitter::Splitter;

use std::sync::Arc;

use crate::error::ProcessError;
use crate::unit::{ProcessingUnit, UnitControl};

/// Audio half of a node.
pub(crate) enum NodeProcessor {
    External(Box<dyn ProcessingUnit>),
    Mixer(Mixer),
    Splitter(Splitter),
    Gain(Gain),
}

impl NodeProcessor {
    #[inline]
    pub(crate) fn process(
        &mut self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        match self {
            Self::External(unit) => unit.process(left_in, right_in, left_out, right_out),
            Self::Mixer(mixer) => mixer.process(left_in, right_in, left_out, right_out),
            Self::Splitter(splitter) => splitter.process(left_in, right_in, left_out, right_out),
            Self::Gain(gain) => gain.process(left_in, right_in, left_out, right_out),
        }
    }
}

/// Control half of a node.
#[derive(Clone)]
pub(crate) enum NodeControl {
    External(Arc<dyn UnitControl>),
    Mixer(Arc<MixerState>),
    Splitter,
    Gain(Arc<GainState>),
}

impl NodeControl {
    /// The node's capability interface.
    pub(crate) fn as_unit(&self) -> &dyn UnitControl {
        match self {
            Self::External(control) => control.as_ref(),
            Self::Mixer(state) => state.as_ref(),
            Self::Splitter => &Splitter,
            Self::Gain(state) => state.as_ref(),
        }
    }
}

/// Splits a node into its two halves.
pub(crate) fn external(unit: Box<dyn ProcessingUnit>) -> (NodeProcessor, NodeControl) {
    let control = NodeControl::External(unit.control());
    (NodeProcessor::External(unit), control)
}

pub(crate) fn mixer(inputs: usize) -> (NodeProcessor, NodeControl) {
    let mixer = Mixer::new(inputs);
    let control = NodeControl::Mixer(mixer.state().clone());
    (NodeProcessor::Mixer(mixer), control)
}

pub(crate) fn splitter() -> (NodeProcessor, NodeControl) {
    (NodeProcessor::Splitter(Splitter), NodeControl::Splitter)
}

pub(crate) fn gain(db: f32) -> (NodeProcessor, NodeControl) {
    let gain = Gain::new(db);
    let control = NodeControl::Gain(gain.state().clone());
    (NodeProcessor::Gain(gain), control)
}
