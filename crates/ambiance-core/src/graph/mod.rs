//! Stereo processing graph.
//!
//! A [`Graph`] owns nodes (hosted units and built-ins), a destination-indexed
//! edge table in which every node has at most one source, and an optional
//! input/output designation. Rendering walks a compiled [`Schedule`].
//!
//! # Architecture
//!
//! The system uses a **publish/load split**:
//!
//! - Control threads mutate through [`Graph`]. Each mutation copies the current
//!   topology into a draft under the topology lock, applies the change, compiles
//!   a new [`Schedule`], and publishes the result atomically.
//! - The audio thread renders through a [`Renderer`] (or [`Graph::process`]),
//!   which loads the published topology without locking. A block is always
//!   rendered from one consistent topology.
//!
//! Parameters, notes, and mixer slot gains do not change the topology. They
//! write to per-node atomics and are visible to the next rendered block.
//!
//! # Buffer Efficiency
//!
//! Slot assignment uses liveness analysis: a slot is live from the step that
//! writes it to the last step that reads it. A 20-node linear chain uses exactly
//! 2 slots.
//!
//! # Example
//!
//! ```rust
//! use ambiance_core::{Graph, NoHost, NodeTarget};
//!
//! let graph = Graph::new(48000.0, 256, Box::new(NoHost))?;
//! let input = graph.add_splitter()?;
//! let gain = graph.add_gain(0.0)?;
//! graph.connect(input, gain)?;
//! graph.set_io_nodes(Some(input), Some(gain))?;
//!
//! // Normalized 0.0 is the gain floor.
//! graph.set_param(gain, 0, 0.0)?;
//! graph.note_on(NodeTarget::All, 0, 60, 1.0)?;
//!
//! let renderer = graph.renderer();
//! let input_block = [1.0f32; 256];
//! let (mut left, mut right) = ([0.0f32; 256], [0.0f32; 256]);
//! renderer.process(&input_block, &input_block, &mut left, &mut right)?;
//! assert!((left[0] - 0.001).abs() < 1e-5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod node;
mod processing;
mod renderer;
mod router;
mod schedule;
mod snapshot;
mod topology;

pub use node::{NodeId, NodeKind, NodeTarget};
pub use processing::Graph;
pub use renderer::Renderer;
pub use schedule::{ProcessStep, Schedule, Source};
pub use snapshot::{EdgeSnapshot, GraphSnapshot, NodeSnapshot, ParamValue};
