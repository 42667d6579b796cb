//! Serializable graph state.
//!
//! A [`GraphSnapshot`] records every node's variant and arguments, external
//! units' parameter values, mixer slot gains, the edge table, and the IO
//! designation. Node references are creation indices, so a snapshot restores
//! into any graph whose host can resolve the same locators.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::nodes::NodeControl;
use crate::param::ParamId;

use super::node::{NodeId, NodeKind};
use super::processing::Graph;

/// Full state of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSnapshot {
    /// Index of the node fed by the external input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_input: Option<u32>,
    /// Index of the node rendered to the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_output: Option<u32>,
    /// Nodes in creation order.
    pub nodes: Vec<NodeSnapshot>,
    /// Edges by creation index.
    pub edges: Vec<EdgeSnapshot>,
}

/// One node in a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Variant and constructor arguments.
    pub kind: NodeKind,
    /// Normalized parameter values (external units).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamValue>,
    /// Linear slot gains (mixers).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gains: Vec<f32>,
}

impl NodeSnapshot {
    /// A node with no recorded parameters or gains.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
            gains: Vec::new(),
        }
    }
}

/// A recorded parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamValue {
    /// Parameter id.
    pub id: ParamId,
    /// Normalized value.
    pub value: f32,
}

/// An edge by creation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    /// Source node.
    pub from: u32,
    /// Destination node.
    pub to: u32,
}

impl GraphSnapshot {
    /// Checks that every index refers to a node of the snapshot.
    pub fn validate(&self) -> Result<(), GraphError> {
        let count = self.nodes.len();
        let check = |what: &str, index: u32| {
            if (index as usize) < count {
                Ok(())
            } else {
                Err(GraphError::invalid_argument(format!(
                    "{what} refers to node {index}, but the snapshot has {count} nodes"
                )))
            }
        };
        for edge in &self.edges {
            check("edge", edge.from)?;
            check("edge", edge.to)?;
        }
        if let Some(index) = self.io_input {
            check("input designation", index)?;
        }
        if let Some(index) = self.io_output {
            check("output designation", index)?;
        }
        Ok(())
    }
}

impl Graph {
    /// Captures the current topology and node state.
    pub fn snapshot(&self) -> GraphSnapshot {
        let topology = self.load();
        let nodes = topology
            .nodes
            .iter()
            .map(|entry| {
                let mut node = NodeSnapshot::new(entry.current_kind());
                match &entry.control {
                    NodeControl::External(control) => {
                        node.params = (0..control.param_count())
                            .filter_map(|i| control.param_info(i))
                            .filter_map(|info| {
                                control.get_param(info.id).map(|value| ParamValue {
                                    id: info.id,
                                    value,
                                })
                            })
                            .collect();
                    }
                    NodeControl::Mixer(state) => {
                        node.gains = (0..state.inputs()).filter_map(|i| state.gain(i)).collect();
                    }
                    // Gain level is carried by the kind.
                    NodeControl::Splitter | NodeControl::Gain(_) => {}
                }
                node
            })
            .collect();

        let edges = topology
            .sources
            .iter()
            .enumerate()
            .filter_map(|(to, from)| {
                from.map(|from| EdgeSnapshot {
                    from: from as u32,
                    to: to as u32,
                })
            })
            .collect();

        GraphSnapshot {
            io_input: topology.io_input.map(|i| i as u32),
            io_output: topology.io_output.map(|i| i as u32),
            nodes,
            edges,
        }
    }

    /// Replaces the whole graph with `snapshot`.
    ///
    /// The new topology is published in one step. On any failure (an
    /// unresolvable locator, a rejected parameter, an invalid edge) the graph is
    /// left untouched. Returns the new handles in snapshot order.
    pub fn restore(&self, snapshot: &GraphSnapshot) -> Result<Vec<NodeId>, GraphError> {
        snapshot.validate()?;

        let ids = self.edit(|draft, editor| {
            draft.clear();
            let mut ids = Vec::with_capacity(snapshot.nodes.len());
            for node in &snapshot.nodes {
                let id = draft.instantiate(node.kind.clone(), editor.host.as_mut())?;
                let control = &draft.nodes[id.slot()].control;
                control.as_unit().set_transport(&editor.transport);

                for param in &node.params {
                    control
                        .as_unit()
                        .set_param(param.id, param.value)
                        .map_err(|source| GraphError::Control { node: id, source })?;
                }
                if !node.gains.is_empty() {
                    let NodeControl::Mixer(state) = control else {
                        return Err(GraphError::invalid_argument(format!(
                            "{id} is not a mixer but has slot gains"
                        )));
                    };
                    for (slot, &gain) in node.gains.iter().enumerate() {
                        if !gain.is_finite() || !state.set_gain(slot, gain) {
                            return Err(GraphError::invalid_argument(format!(
                                "invalid gain {gain} for slot {slot} of {id}"
                            )));
                        }
                    }
                }
                ids.push(id);
            }

            for edge in &snapshot.edges {
                draft.connect(ids[edge.from as usize], ids[edge.to as usize])?;
            }
            draft.set_io(
                snapshot.io_input.map(|i| ids[i as usize]),
                snapshot.io_output.map(|i| ids[i as usize]),
            )?;
            Ok(ids)
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_restore: {} nodes, {} edges",
            snapshot.nodes.len(),
            snapshot.edges.len()
        );

        Ok(ids)
    }
}
