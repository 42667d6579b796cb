//! Node handles and per-node storage.
//!
//! A [`NodeId`] is the handle returned by the `add_*` methods of
//! [`Graph`](crate::Graph). It carries the node's creation index and the epoch
//! of the graph it was issued in; `clear` starts a new epoch, so a handle issued
//! before it never resolves again, even after its index has been reused.

use core::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::nodes::{NodeControl, NodeProcessor};

/// Handle of a node in a [`Graph`](crate::Graph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    epoch: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, epoch: u32) -> Self {
        Self { index, epoch }
    }

    /// Creation index: 0 for the first node added after construction or `clear`.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Epoch the handle was issued in.
    #[inline]
    pub fn epoch(self) -> u32 {
        self.epoch
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.index)
    }
}

/// Destination of a note event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeTarget {
    /// One node.
    Node(NodeId),
    /// Every node, in creation order.
    All,
}

impl From<NodeId> for NodeTarget {
    fn from(id: NodeId) -> Self {
        NodeTarget::Node(id)
    }
}

/// A node variant together with its constructor arguments.
///
/// Returned by [`Graph::node_kind`](crate::Graph::node_kind) and stored in
/// [`GraphSnapshot`](super::GraphSnapshot)s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A unit resolved by the graph's host.
    External {
        /// Locator passed to the host.
        locator: String,
        /// Variant selector passed to the host.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variant: Option<String>,
    },
    /// N-input summing mixer.
    Mixer {
        /// Number of input slots.
        inputs: usize,
    },
    /// Identity pass-through.
    Splitter,
    /// Scalar gain stage.
    Gain {
        /// Level in dB.
        db: f32,
    },
}

impl NodeKind {
    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::External { .. } => "external",
            NodeKind::Mixer { .. } => "mixer",
            NodeKind::Splitter => "splitter",
            NodeKind::Gain { .. } => "gain",
        }
    }
}

/// Storage for one node, shared by every topology that contains it.
pub(crate) struct NodeEntry {
    pub id: NodeId,
    /// Variant and arguments the node was created with.
    pub kind: NodeKind,
    /// Audio half. Only the render path locks it, with `try_lock`.
    pub processor: Mutex<NodeProcessor>,
    pub control: NodeControl,
}

impl NodeEntry {
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        (processor, control): (NodeProcessor, NodeControl),
    ) -> Self {
        Self {
            id,
            kind,
            processor: Mutex::new(processor),
            control,
        }
    }

    /// The creation arguments updated with live state.
    pub fn current_kind(&self) -> NodeKind {
        match &self.control {
            NodeControl::Gain(state) => NodeKind::Gain { db: state.db() },
            _ => self.kind.clone(),
        }
    }
}
