//! Published topologies and the draft they are edited through.
//!
//! A [`Topology`] is immutable once published: nodes, the destination-indexed
//! edge table, IO designation, the compiled [`Schedule`], and the buffer pool the
//! schedule renders into. Mutations copy the current topology into a [`Draft`],
//! apply changes, and compile the draft into the next topology. Node storage is
//! shared between consecutive topologies through `Arc`, so copying is cheap and
//! node state survives every edit.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::BufferPool;
use crate::error::GraphError;
use crate::host::{UnitHost, UnitRequest};
use crate::nodes;

use super::node::{NodeEntry, NodeId, NodeKind};
use super::schedule::Schedule;

/// Immutable graph state read by the render path.
pub(crate) struct Topology {
    pub epoch: u32,
    pub sample_rate: f32,
    pub max_block_frames: usize,
    pub nodes: Vec<Arc<NodeEntry>>,
    /// `sources[n]` feeds node `n`.
    pub sources: Vec<Option<usize>>,
    pub io_input: Option<usize>,
    pub io_output: Option<usize>,
    pub schedule: Schedule,
    /// Render scratch. Only the render path locks it, with `try_lock`.
    pub scratch: Mutex<BufferPool>,
}

impl Topology {
    pub fn empty(sample_rate: f32, max_block_frames: usize) -> Self {
        Self {
            epoch: 0,
            sample_rate,
            max_block_frames,
            nodes: Vec::new(),
            sources: Vec::new(),
            io_input: None,
            io_output: None,
            schedule: Schedule::default(),
            scratch: Mutex::new(BufferPool::new(0, max_block_frames)),
        }
    }

    /// Resolves a handle issued in this topology's epoch.
    pub fn node(&self, id: NodeId) -> Result<&Arc<NodeEntry>, GraphError> {
        if id.epoch() != self.epoch {
            return Err(GraphError::InvalidNode(id));
        }
        self.nodes.get(id.slot()).ok_or(GraphError::InvalidNode(id))
    }

    /// Node whose output is rendered: `io_output`, else the last created.
    pub fn output_node(&self) -> Option<usize> {
        self.io_output.or_else(|| self.nodes.len().checked_sub(1))
    }

    pub fn id_of(&self, index: usize) -> NodeId {
        NodeId::new(index as u32, self.epoch)
    }
}

/// Mutable copy of a topology.
pub(crate) struct Draft {
    pub epoch: u32,
    sample_rate: f32,
    max_block_frames: usize,
    pub nodes: Vec<Arc<NodeEntry>>,
    pub sources: Vec<Option<usize>>,
    pub io_input: Option<usize>,
    pub io_output: Option<usize>,
}

impl Draft {
    pub fn of(topology: &Topology) -> Self {
        Self {
            epoch: topology.epoch,
            sample_rate: topology.sample_rate,
            max_block_frames: topology.max_block_frames,
            nodes: topology.nodes.clone(),
            sources: topology.sources.clone(),
            io_input: topology.io_input,
            io_output: topology.io_output,
        }
    }

    pub fn resolve(&self, id: NodeId) -> Result<usize, GraphError> {
        if id.epoch() == self.epoch && id.slot() < self.nodes.len() {
            Ok(id.slot())
        } else {
            Err(GraphError::InvalidNode(id))
        }
    }

    /// Creates a node of `kind`, resolving external units through `host`.
    pub fn instantiate(
        &mut self,
        kind: NodeKind,
        host: &mut dyn UnitHost,
    ) -> Result<NodeId, GraphError> {
        let halves = match &kind {
            NodeKind::External { locator, variant } => {
                let request = UnitRequest {
                    locator: locator.as_str(),
                    variant: variant.as_deref(),
                    sample_rate: self.sample_rate,
                    max_block_frames: self.max_block_frames,
                };
                nodes::external(host.instantiate(&request)?)
            }
            NodeKind::Mixer { inputs } => {
                if *inputs == 0 {
                    return Err(GraphError::invalid_argument(
                        "a mixer needs at least one input",
                    ));
                }
                nodes::mixer(*inputs)
            }
            NodeKind::Splitter => nodes::splitter(),
            NodeKind::Gain { db } => {
                if !db.is_finite() {
                    return Err(GraphError::invalid_argument(format!(
                        "gain of {db} dB is not finite"
                    )));
                }
                nodes::gain(*db)
            }
        };

        let index = u32::try_from(self.nodes.len())
            .map_err(|_| GraphError::invalid_argument("node limit reached"))?;
        let id = NodeId::new(index, self.epoch);
        self.nodes.push(Arc::new(NodeEntry::new(id, kind, halves)));
        self.sources.push(None);
        Ok(id)
    }

    /// Sets `from` as the only source of `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;

        // The edge closes a cycle if `to` is `from` or already upstream of it.
        let mut cursor = Some(src);
        while let Some(node) = cursor {
            if node == dst {
                return Err(GraphError::CycleDetected { from, to });
            }
            cursor = self.sources[node];
        }

        self.sources[dst] = Some(src);
        Ok(())
    }

    /// Removes the edge `from -> to` if it is the current source of `to`.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        let src = self.resolve(from)?;
        let dst = self.resolve(to)?;
        if self.sources[dst] != Some(src) {
            return Err(GraphError::NotConnected { from, to });
        }
        self.sources[dst] = None;
        Ok(())
    }

    pub fn set_io(
        &mut self,
        input: Option<NodeId>,
        output: Option<NodeId>,
    ) -> Result<(), GraphError> {
        let input = input.map(|id| self.resolve(id)).transpose()?;
        let output = output.map(|id| self.resolve(id)).transpose()?;
        self.io_input = input;
        self.io_output = output;
        Ok(())
    }

    /// Drops every node and edge and starts a new epoch.
    pub fn clear(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.nodes.clear();
        self.sources.clear();
        self.io_input = None;
        self.io_output = None;
    }

    /// Compiles the draft into a publishable topology.
    pub fn compile(self) -> Result<Topology, GraphError> {
        let output_node = self.io_output.or_else(|| self.nodes.len().checked_sub(1));
        let schedule = Schedule::compile(&self.sources, self.io_input, output_node)
            .ok_or_else(|| GraphError::invalid_argument("edge table contains a cycle"))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_compile: {} nodes, {} buffers, epoch {}",
            self.nodes.len(),
            schedule.buffer_count(),
            self.epoch
        );

        let scratch = Mutex::new(BufferPool::new(
            schedule.buffer_count(),
            self.max_block_frames,
        ));
        Ok(Topology {
            epoch: self.epoch,
            sample_rate: self.sample_rate,
            max_block_frames: self.max_block_frames,
            nodes: self.nodes,
            sources: self.sources,
            io_input: self.io_input,
            io_output: self.io_output,
            schedule,
            scratch,
        })
    }
}
