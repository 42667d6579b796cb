//! Note events, parameters, latency, and transport.
//!
//! These operations reach nodes through their control half on the published
//! topology, which is loaded wait-free. They never take the topology lock, so
//! they are safe to call from the audio thread as well as from control threads
//! (the exceptions are [`Graph::set_transport`] and [`Graph::transport`], which
//! share the lock with topology edits).

use crate::error::{ControlError, GraphError};
use crate::nodes::NodeControl;
use crate::param::{ParamId, ParamInfo};
use crate::transport::Transport;

use super::node::{NodeId, NodeTarget};
use super::processing::Graph;
use super::topology::Topology;

/// MIDI channels are 0-based and below 16.
const MAX_CHANNEL: u8 = 15;
const MAX_PITCH: u8 = 127;

fn validate_note(channel: u8, pitch: u8, velocity: f32) -> Result<(), GraphError> {
    if channel > MAX_CHANNEL {
        return Err(GraphError::invalid_argument(format!(
            "channel {channel} is out of range"
        )));
    }
    if pitch > MAX_PITCH {
        return Err(GraphError::invalid_argument(format!(
            "pitch {pitch} is out of range"
        )));
    }
    if !(0.0..=1.0).contains(&velocity) {
        return Err(GraphError::invalid_argument(format!(
            "velocity {velocity} is not in [0, 1]"
        )));
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Note {
    On,
    Off,
}

impl Graph {
    /// Sends a note-on to one node, or to every node in creation order.
    ///
    /// A broadcast is best effort: nodes that reject the note are skipped and the
    /// call still succeeds. A targeted note reports the node's rejection.
    pub fn note_on(
        &self,
        target: impl Into<NodeTarget>,
        channel: u8,
        pitch: u8,
        velocity: f32,
    ) -> Result<(), GraphError> {
        self.route_note(target.into(), Note::On, channel, pitch, velocity)
    }

    /// Sends a note-off to one node, or to every node in creation order.
    pub fn note_off(
        &self,
        target: impl Into<NodeTarget>,
        channel: u8,
        pitch: u8,
        velocity: f32,
    ) -> Result<(), GraphError> {
        self.route_note(target.into(), Note::Off, channel, pitch, velocity)
    }

    fn route_note(
        &self,
        target: NodeTarget,
        note: Note,
        channel: u8,
        pitch: u8,
        velocity: f32,
    ) -> Result<(), GraphError> {
        validate_note(channel, pitch, velocity)?;
        let topology = self.load();
        let send = |node: &NodeControl| -> Result<(), ControlError> {
            let unit = node.as_unit();
            match note {
                Note::On => unit.note_on(channel, pitch, velocity),
                Note::Off => unit.note_off(channel, pitch, velocity),
            }
        };

        match target {
            NodeTarget::Node(id) => {
                let entry = topology.node(id)?;
                send(&entry.control).map_err(|source| GraphError::Control { node: id, source })
            }
            NodeTarget::All => {
                for entry in &topology.nodes {
                    // Best effort: one node's rejection does not stop the others.
                    let _ = send(&entry.control);
                }
                Ok(())
            }
        }
    }

    /// Number of parameters a node exposes.
    pub fn param_count(&self, node: NodeId) -> Result<usize, GraphError> {
        Ok(self.load().node(node)?.control.as_unit().param_count())
    }

    /// Describes the parameter at `index` (`0..param_count`).
    pub fn param_info(&self, node: NodeId, index: usize) -> Result<ParamInfo, GraphError> {
        self.load()
            .node(node)?
            .control
            .as_unit()
            .param_info(index)
            .ok_or(GraphError::ParamIndexOutOfRange { node, index })
    }

    /// Normalized value of a parameter.
    pub fn get_param(&self, node: NodeId, param: impl Into<ParamId>) -> Result<f32, GraphError> {
        let param = param.into();
        self.load()
            .node(node)?
            .control
            .as_unit()
            .get_param(param)
            .ok_or(GraphError::Control {
                node,
                source: ControlError::UnknownParameter(param),
            })
    }

    /// Sets a parameter from a normalized value.
    ///
    /// Unknown ids fail and leave every parameter unchanged.
    pub fn set_param(
        &self,
        node: NodeId,
        param: impl Into<ParamId>,
        value: f32,
    ) -> Result<(), GraphError> {
        self.load()
            .node(node)?
            .control
            .as_unit()
            .set_param(param.into(), value)
            .map_err(|source| GraphError::Control { node, source })
    }

    /// Latency a node reports, in samples.
    pub fn node_latency(&self, node: NodeId) -> Result<usize, GraphError> {
        Ok(self.load().node(node)?.control.as_unit().latency_samples())
    }

    /// Latency accumulated along the chain feeding the output node.
    ///
    /// Reported only; the graph does not compensate for it.
    pub fn latency_samples(&self) -> usize {
        chain_latency(&self.load())
    }

    /// Stores the host transport and forwards it to every node.
    pub fn set_transport(&self, transport: Transport) {
        let mut editor = self.editor.lock();
        editor.transport = transport;
        for entry in &self.load().nodes {
            entry.control.as_unit().set_transport(&transport);
        }
    }

    /// Most recently stored transport.
    pub fn transport(&self) -> Transport {
        self.editor.lock().transport
    }
}

/// Sums node latencies from the output node back through its sources, stopping
/// at the designated input node, whose buffer is the caller's input.
fn chain_latency(topology: &Topology) -> usize {
    let mut total = 0;
    let mut cursor = topology.output_node();
    while let Some(node) = cursor {
        if Some(node) == topology.io_input {
            break;
        }
        total += topology.nodes[node].control.as_unit().latency_samples();
        cursor = topology.sources[node];
    }
    total
}
