//! Ambiance Core - real-time stereo processing graph
//!
//! This crate hosts audio processing units in a graph of stereo nodes and renders
//! it block by block, with zero allocation and no blocking locks on the audio
//! path.
//!
//! # Core Abstractions
//!
//! ## Unit Contract
//!
//! - [`ProcessingUnit`] - Audio half of a unit: renders stereo blocks
//! - [`UnitControl`] - Control half: notes, parameters, latency, transport
//! - [`UnitHost`] - Resolves a locator to an activated unit
//!
//! ## Graph
//!
//! - [`Graph`] - Topology store, edits, queries, and event routing
//! - [`Renderer`] - Audio-thread handle rendering the published topology
//! - [`GraphSnapshot`] - Serializable graph state for save and restore
//!
//! ## Built-in Nodes
//!
//! - [`Mixer`] - Weighted N-slot summing mixer
//! - [`Splitter`] - Identity pass-through
//! - [`Gain`] - Scalar gain with one normalized parameter
//!
//! ## Utilities
//!
//! - Level conversion: [`db_to_linear`], [`linear_to_db`], [`normalized_to_db`],
//!   [`db_to_normalized`]
//! - [`AtomicF32`] for lock-free parameter storage
//!
//! # Example
//!
//! ```rust
//! use ambiance_core::{Graph, NoHost};
//!
//! let graph = Graph::new(48000.0, 128, Box::new(NoHost))?;
//! let input = graph.add_splitter()?;
//! let mixer = graph.add_mixer(2)?;
//! graph.connect(input, mixer)?;
//! graph.set_io_nodes(Some(input), Some(mixer))?;
//! graph.set_mixer_gain(mixer, 0, 0.5)?;
//!
//! let block = [0.8f32; 128];
//! let (mut left, mut right) = ([0.0f32; 128], [0.0f32; 128]);
//! graph.process(&block, &block, &mut left, &mut right)?;
//! assert!((left[0] - 0.4).abs() < 1e-6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations or blocking locks while rendering
//! - **Snapshot publication**: The audio thread never sees a half-applied edit
//! - **Split units**: Audio state is owned by the renderer, control state is shared

pub mod buffer;
pub mod error;
pub mod graph;
pub mod host;
pub mod math;
pub mod nodes;
pub mod param;
pub mod transport;
pub mod unit;

// Re-export main types at crate root
pub use buffer::{BufferPool, StereoBuffer};
pub use error::{ControlError, GraphError, HostError, ProcessError, RenderError};
pub use graph::{
    EdgeSnapshot, Graph, GraphSnapshot, NodeId, NodeKind, NodeSnapshot, NodeTarget, ParamValue,
    ProcessStep, Renderer, Schedule, Source,
};
pub use host::{NoHost, UnitHost, UnitRequest};
pub use math::{
    GAIN_CEILING_DB, GAIN_FLOOR_DB, db_to_linear, db_to_normalized, linear_to_db,
    normalized_to_db,
};
pub use nodes::{GAIN_PARAM, Gain, GainState, Mixer, MixerState, Splitter};
pub use param::{AtomicF32, ParamId, ParamInfo, ParamUnit};
pub use transport::Transport;
pub use unit::{ProcessingUnit, UnitControl};
