//! Block rendering on the audio thread.
//!
//! [`Renderer`] loads the published topology wait-free and walks its compiled
//! schedule. It takes no lock that a control thread could hold: node processors
//! and the buffer pool are only ever `try_lock`ed, by renderers. Nothing here
//! allocates.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::RenderError;

use super::schedule::Source;
use super::topology::Topology;

/// Audio-thread handle to a [`Graph`](super::Graph).
///
/// Cheap to clone. Never blocks the graph's control side. It does not keep the
/// graph's nodes alive: once the [`Graph`](super::Graph) is dropped it renders
/// silence.
#[derive(Clone)]
pub struct Renderer {
    shared: Arc<ArcSwap<Topology>>,
}

impl Renderer {
    pub(super) fn new(shared: Arc<ArcSwap<Topology>>) -> Self {
        Self { shared }
    }

    /// Renders one block from the most recently published topology.
    ///
    /// All four slices must have the same length, at most the graph's maximum
    /// block size. `left_in`/`right_in` stand in for the designated input node's
    /// buffer: nodes it feeds read them, and the node's own output is discarded.
    /// The output node's buffer (or the last created node's, if no output is
    /// designated) is copied into `left_out`/`right_out`.
    ///
    /// On error the output slices are filled with silence.
    pub fn process(
        &self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), RenderError> {
        render_block(&self.shared.load(), left_in, right_in, left_out, right_out)
    }

    /// Sample rate of the graph.
    pub fn sample_rate(&self) -> f32 {
        self.shared.load().sample_rate
    }

    /// Largest block [`process()`](Self::process) accepts.
    pub fn max_block_frames(&self) -> usize {
        self.shared.load().max_block_frames
    }
}

/// Renders one block, silencing the output on failure.
pub(super) fn render_block(
    topology: &Topology,
    left_in: &[f32],
    right_in: &[f32],
    left_out: &mut [f32],
    right_out: &mut [f32],
) -> Result<(), RenderError> {
    let result = run_schedule(topology, left_in, right_in, left_out, right_out);
    if result.is_err() {
        left_out.fill(0.0);
        right_out.fill(0.0);
    }
    result
}

fn run_schedule(
    topology: &Topology,
    left_in: &[f32],
    right_in: &[f32],
    left_out: &mut [f32],
    right_out: &mut [f32],
) -> Result<(), RenderError> {
    let frames = left_out.len();
    if right_out.len() != frames || left_in.len() != frames || right_in.len() != frames {
        return Err(RenderError::LengthMismatch);
    }
    if frames > topology.max_block_frames {
        return Err(RenderError::BlockTooLarge {
            frames,
            max: topology.max_block_frames,
        });
    }

    let Some(mut pool) = topology.scratch.try_lock() else {
        return Err(RenderError::Busy);
    };

    for step in topology.schedule.steps() {
        let entry = &topology.nodes[step.node];
        let Some(mut processor) = entry.processor.try_lock() else {
            return Err(RenderError::Busy);
        };

        let result = match step.input {
            Source::External => {
                let out = pool.get_mut(step.output);
                out.clear(frames);
                let (out_l, out_r) = out.channels_mut(frames);
                processor.process(left_in, right_in, out_l, out_r)
            }
            Source::Silence => {
                let (silence, out) = pool.silence_and(step.output);
                out.clear(frames);
                let (in_l, in_r) = silence.channels(frames);
                let (out_l, out_r) = out.channels_mut(frames);
                processor.process(in_l, in_r, out_l, out_r)
            }
            Source::Slot(slot) => {
                let (src, out) = pool.read_write(slot, step.output);
                out.clear(frames);
                let (in_l, in_r) = src.channels(frames);
                let (out_l, out_r) = out.channels_mut(frames);
                processor.process(in_l, in_r, out_l, out_r)
            }
        };
        result.map_err(|source| RenderError::Unit {
            node: entry.id,
            source,
        })?;
    }

    match topology.schedule.output() {
        Source::Slot(slot) => {
            let (l, r) = pool.get(slot).channels(frames);
            left_out.copy_from_slice(l);
            right_out.copy_from_slice(r);
        }
        Source::External => {
            left_out.copy_from_slice(left_in);
            right_out.copy_from_slice(right_in);
        }
        Source::Silence => {
            left_out.fill(0.0);
            right_out.fill(0.0);
        }
    }
    Ok(())
}
