//! Error types for graph, unit, and render operations.
//!
//! Errors raised on the audio thread ([`ProcessError`], [`RenderError`]) are
//! `Copy` and carry no heap data, so reporting them never allocates.

use thiserror::Error;

use crate::graph::NodeId;
use crate::param::ParamId;

/// Failure reported by a unit's `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The unit has not been activated or has been shut down.
    #[error("unit is not active")]
    Inactive,

    /// The block is larger than the unit was activated for.
    #[error("block of {frames} frames exceeds the unit's capacity of {max}")]
    BlockTooLarge {
        /// Frames requested.
        frames: usize,
        /// Frames the unit can process at once.
        max: usize,
    },

    /// The unit reported a failure status.
    #[error("unit reported failure code {0}")]
    Failed(i32),
}

/// Failure reported by a unit's control half (notes and parameters).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// The unit does not expose this parameter id.
    #[error("unknown {0}")]
    UnknownParameter(ParamId),

    /// The value is not a normalized parameter value.
    #[error("value {0} is not a normalized parameter value")]
    InvalidValue(f32),

    /// The unit refused the event.
    #[error("unit rejected the event")]
    Rejected,
}

/// Failure to resolve or activate a hosted unit.
#[derive(Debug, Error)]
pub enum HostError {
    /// Nothing is registered under the locator.
    #[error("no unit found for locator '{0}'")]
    NotFound(String),

    /// The locator exists but does not offer the requested variant.
    #[error("unit '{locator}' has no variant '{variant}'")]
    UnknownVariant {
        /// Locator that was resolved.
        locator: String,
        /// Variant selector that was not recognised.
        variant: String,
    },

    /// The unit was found but could not be activated.
    #[error("unit '{locator}' failed to activate: {reason}")]
    Activation {
        /// Locator that was resolved.
        locator: String,
        /// Description of the activation failure.
        reason: String,
    },
}

impl HostError {
    /// Create an activation error.
    pub fn activation(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        HostError::Activation {
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from topology mutation, event routing, and parameter access.
///
/// Every failing operation leaves the graph unchanged.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The host could not resolve the requested external unit.
    #[error("unit could not be resolved: {0}")]
    NotFound(#[from] HostError),

    /// The handle is out of range or was issued before the last `clear`.
    #[error("{0} is not a node of this graph")]
    InvalidNode(NodeId),

    /// A structurally invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The edge would make a node depend on its own output.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Requested source.
        from: NodeId,
        /// Requested destination.
        to: NodeId,
    },

    /// `disconnect` named a source that does not feed the destination.
    #[error("{to} is not fed by {from}")]
    NotConnected {
        /// Named source.
        from: NodeId,
        /// Named destination.
        to: NodeId,
    },

    /// Parameter enumeration past the node's parameter count.
    #[error("{node} has no parameter at index {index}")]
    ParamIndexOutOfRange {
        /// Node queried.
        node: NodeId,
        /// Requested index.
        index: usize,
    },

    /// A node's control half rejected a note or parameter operation.
    #[error("{node}: {source}")]
    Control {
        /// Node addressed.
        node: NodeId,
        /// Error reported by the node.
        source: ControlError,
    },
}

impl GraphError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        GraphError::InvalidArgument(msg.into())
    }
}

/// Failure of a block render.
///
/// The output slices are silent whenever this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Input and output slices differ in length.
    #[error("channel slices differ in length")]
    LengthMismatch,

    /// The block is larger than the graph's maximum block size.
    #[error("block of {frames} frames exceeds the maximum of {max}")]
    BlockTooLarge {
        /// Frames requested.
        frames: usize,
        /// Maximum block size of the graph.
        max: usize,
    },

    /// Another renderer is processing the same topology.
    #[error("topology is in use by another renderer")]
    Busy,

    /// A node's `process` call failed.
    #[error("{node} failed to process: {source}")]
    Unit {
        /// Node that failed.
        node: NodeId,
        /// Error reported by the node.
        source: ProcessError,
    },
}
