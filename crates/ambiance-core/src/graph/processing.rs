//! Processing graph: topology mutation and publication.
//!
//! [`Graph`] is the control-side entry point. Each mutation takes the topology
//! lock, edits a [`Draft`] copied from the published [`Topology`], compiles it,
//! and publishes the result through an [`ArcSwap`]. Renderers load the published
//! topology without locking, so an edit never stalls the audio thread and the
//! audio thread never observes a half-applied edit.
//!
//! Replaced topologies are parked in a retire list and dropped on a later edit
//! (or [`Graph::release_retired`]), once no renderer still holds them. Dropping
//! the graph unpublishes its nodes and waits for renderers to let go, so node
//! state and hosted units are always freed on the control side.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::{GraphError, RenderError};
use crate::host::UnitHost;
use crate::nodes::NodeControl;
use crate::transport::Transport;

use super::node::{NodeId, NodeKind};
use super::renderer::{Renderer, render_block};
use super::topology::{Draft, Topology};

/// Control-thread state guarded by the topology lock.
pub(super) struct Editor {
    pub(super) host: Box<dyn UnitHost>,
    retired: Vec<Arc<Topology>>,
    pub(super) transport: Transport,
}

impl Editor {
    fn retire(&mut self, topology: Arc<Topology>) {
        self.retired.push(topology);
        self.release();
    }

    /// Drops retired topologies no renderer holds. Returns how many remain.
    fn release(&mut self) -> usize {
        self.retired.retain(|t| Arc::strong_count(t) > 1);
        self.retired.len()
    }
}

/// Real-time stereo processing graph.
///
/// Nodes are added with [`add_external()`](Self::add_external),
/// [`add_mixer()`](Self::add_mixer), [`add_splitter()`](Self::add_splitter) and
/// [`add_gain()`](Self::add_gain), wired with [`connect()`](Self::connect), and
/// rendered with [`process()`](Self::process) or a [`Renderer`] handed to the
/// audio thread. Every node has at most one incoming edge.
///
/// All methods take `&self`; share the graph between control threads with an
/// `Arc`.
///
/// # Example
///
/// ```rust
/// use ambiance_core::{Graph, NoHost};
///
/// let graph = Graph::new(48000.0, 512, Box::new(NoHost))?;
/// let input = graph.add_splitter()?;
/// let gain = graph.add_gain(-6.0)?;
/// graph.connect(input, gain)?;
/// graph.set_io_nodes(Some(input), Some(gain))?;
///
/// let left_in = [0.5f32; 512];
/// let right_in = [0.5f32; 512];
/// let mut left_out = [0.0f32; 512];
/// let mut right_out = [0.0f32; 512];
/// graph.process(&left_in, &right_in, &mut left_out, &mut right_out)?;
/// assert!((left_out[0] - 0.25).abs() < 0.01);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Graph {
    pub(super) shared: Arc<ArcSwap<Topology>>,
    pub(super) editor: Mutex<Editor>,
    sample_rate: f32,
    max_block_frames: usize,
}

impl Graph {
    /// Creates an empty graph.
    ///
    /// `host` resolves the graph's external units and is owned by the graph.
    pub fn new(
        sample_rate: f32,
        max_block_frames: usize,
        host: Box<dyn UnitHost>,
    ) -> Result<Self, GraphError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(GraphError::invalid_argument(format!(
                "sample rate {sample_rate} is not positive"
            )));
        }
        if max_block_frames == 0 {
            return Err(GraphError::invalid_argument(
                "maximum block size must be at least one frame",
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_new: {sample_rate} Hz, {max_block_frames} frames");

        Ok(Self {
            shared: Arc::new(ArcSwap::from_pointee(Topology::empty(
                sample_rate,
                max_block_frames,
            ))),
            editor: Mutex::new(Editor {
                host,
                retired: Vec::new(),
                transport: Transport::default(),
            }),
            sample_rate,
            max_block_frames,
        })
    }

    /// Runs `f` against a draft of the current topology and publishes the result.
    ///
    /// Nothing is published if `f` or compilation fails.
    pub(super) fn edit<T>(
        &self,
        f: impl FnOnce(&mut Draft, &mut Editor) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        let mut editor = self.editor.lock();
        let current = self.shared.load_full();
        let mut draft = Draft::of(&current);
        let value = f(&mut draft, &mut *editor)?;
        let next = draft.compile()?;
        self.shared.store(Arc::new(next));
        editor.retire(current);
        Ok(value)
    }

    pub(super) fn load(&self) -> arc_swap::Guard<Arc<Topology>> {
        self.shared.load()
    }

    // --- Node creation ---

    /// Adds a unit resolved by the host from `locator` and `variant`.
    ///
    /// The host activates the unit at this graph's sample rate and maximum block
    /// size. Returns [`GraphError::NotFound`] if the host cannot provide it; no
    /// node is created in that case.
    pub fn add_external(&self, locator: &str, variant: Option<&str>) -> Result<NodeId, GraphError> {
        let id = self.edit(|draft, editor| {
            let kind = NodeKind::External {
                locator: locator.to_owned(),
                variant: variant.map(str::to_owned),
            };
            let id = draft.instantiate(kind, editor.host.as_mut())?;
            draft.nodes[id.slot()]
                .control
                .as_unit()
                .set_transport(&editor.transport);
            Ok(id)
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: external node {id} ({locator})");

        Ok(id)
    }

    /// Adds a mixer with `inputs` slots at unity gain.
    pub fn add_mixer(&self, inputs: usize) -> Result<NodeId, GraphError> {
        let id = self.add_builtin(NodeKind::Mixer { inputs })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: mixer node {id} ({inputs} inputs)");

        Ok(id)
    }

    /// Adds a pass-through node.
    pub fn add_splitter(&self) -> Result<NodeId, GraphError> {
        let id = self.add_builtin(NodeKind::Splitter)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: splitter node {id}");

        Ok(id)
    }

    /// Adds a gain stage at `db`.
    pub fn add_gain(&self, db: f32) -> Result<NodeId, GraphError> {
        let id = self.add_builtin(NodeKind::Gain { db })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: gain node {id} ({db} dB)");

        Ok(id)
    }

    fn add_builtin(&self, kind: NodeKind) -> Result<NodeId, GraphError> {
        self.edit(|draft, editor| draft.instantiate(kind, editor.host.as_mut()))
    }

    // --- Edges and IO ---

    /// Makes `from` the only source of `to`, replacing any previous source.
    ///
    /// Fails for invalid handles and for edges that would close a cycle.
    pub fn connect(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.edit(|draft, _| draft.connect(from, to))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");

        Ok(())
    }

    /// Removes the edge `from -> to`.
    ///
    /// Fails with [`GraphError::NotConnected`] if `from` is not the current source
    /// of `to`.
    pub fn disconnect(&self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.edit(|draft, _| draft.disconnect(from, to))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {from} → {to}");

        Ok(())
    }

    /// Designates the node whose buffer is the external input and the node
    /// rendered to the output. `None` unsets either.
    pub fn set_io_nodes(
        &self,
        input: Option<NodeId>,
        output: Option<NodeId>,
    ) -> Result<(), GraphError> {
        self.edit(|draft, _| draft.set_io(input, output))?;

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_io: input {input:?}, output {output:?}");

        Ok(())
    }

    /// Drops every node and edge and unsets the IO designation.
    ///
    /// Handles issued before the call no longer resolve.
    pub fn clear(&self) {
        let result = self.edit(|draft, _| {
            draft.clear();
            Ok(())
        });
        // An empty draft always compiles.
        debug_assert!(result.is_ok());

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_clear");
    }

    // --- Queries ---

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.load().nodes.len()
    }

    /// Handles of all nodes in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let topology = self.load();
        (0..topology.nodes.len()).map(|i| topology.id_of(i)).collect()
    }

    /// Whether `id` resolves to a node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        self.load().node(id).is_ok()
    }

    /// Variant and current constructor arguments of a node.
    pub fn node_kind(&self, id: NodeId) -> Result<NodeKind, GraphError> {
        Ok(self.load().node(id)?.current_kind())
    }

    /// Current source of `to`.
    pub fn source_of(&self, to: NodeId) -> Result<Option<NodeId>, GraphError> {
        let topology = self.load();
        topology.node(to)?;
        Ok(topology.sources[to.slot()].map(|src| topology.id_of(src)))
    }

    /// All edges as `(source, destination)`, ordered by destination.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let topology = self.load();
        topology
            .sources
            .iter()
            .enumerate()
            .filter_map(|(dst, src)| src.map(|src| (topology.id_of(src), topology.id_of(dst))))
            .collect()
    }

    /// Designated input and output nodes.
    pub fn io_nodes(&self) -> (Option<NodeId>, Option<NodeId>) {
        let topology = self.load();
        (
            topology.io_input.map(|i| topology.id_of(i)),
            topology.io_output.map(|i| topology.id_of(i)),
        )
    }

    /// Sample rate fixed at construction.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest block [`process()`](Self::process) accepts.
    pub fn max_block_frames(&self) -> usize {
        self.max_block_frames
    }

    // --- Mixer slots ---

    /// Sets the linear gain of one mixer slot.
    pub fn set_mixer_gain(&self, id: NodeId, slot: usize, gain: f32) -> Result<(), GraphError> {
        if !gain.is_finite() {
            return Err(GraphError::invalid_argument(format!(
                "mixer gain {gain} is not finite"
            )));
        }
        let topology = self.load();
        let NodeControl::Mixer(state) = &topology.node(id)?.control else {
            return Err(GraphError::invalid_argument(format!("{id} is not a mixer")));
        };
        if state.set_gain(slot, gain) {
            Ok(())
        } else {
            Err(GraphError::invalid_argument(format!(
                "{id} has no input slot {slot}"
            )))
        }
    }

    /// Linear gain of one mixer slot.
    pub fn mixer_gain(&self, id: NodeId, slot: usize) -> Result<f32, GraphError> {
        let topology = self.load();
        let NodeControl::Mixer(state) = &topology.node(id)?.control else {
            return Err(GraphError::invalid_argument(format!("{id} is not a mixer")));
        };
        state
            .gain(slot)
            .ok_or_else(|| GraphError::invalid_argument(format!("{id} has no input slot {slot}")))
    }

    /// Drops replaced topologies that no renderer still holds, releasing the
    /// nodes only they referenced. Returns how many are still in use.
    ///
    /// Edits do this on their own; call it after the last edit to release
    /// removed nodes without waiting for another one.
    pub fn release_retired(&self) -> usize {
        self.editor.lock().release()
    }

    // --- Rendering ---

    /// A handle for the audio thread.
    ///
    /// Once the graph is dropped, the handle renders silence.
    pub fn renderer(&self) -> Renderer {
        Renderer::new(Arc::clone(&self.shared))
    }

    /// Renders one block from the current topology.
    ///
    /// Same as [`Renderer::process`]; the output is silent on error.
    pub fn process(
        &self,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), RenderError> {
        render_block(&self.load(), left_in, right_in, left_out, right_out)
    }
}

impl Drop for Graph {
    /// Unpublishes every node, then waits until no renderer holds an old
    /// topology and drops them here. A renderer holds one for at most a block.
    fn drop(&mut self) {
        let empty = Topology::empty(self.sample_rate, self.max_block_frames);
        let last = self.shared.swap(Arc::new(empty));
        let editor = self.editor.get_mut();
        editor.retired.push(last);
        while editor.release() > 0 {
            std::thread::yield_now();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_drop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoHost;

    fn graph() -> Graph {
        Graph::new(48000.0, 256, Box::new(NoHost)).unwrap()
    }

    #[test]
    fn test_new_validates_arguments() {
        assert!(Graph::new(0.0, 256, Box::new(NoHost)).is_err());
        assert!(Graph::new(f32::NAN, 256, Box::new(NoHost)).is_err());
        assert!(Graph::new(48000.0, 0, Box::new(NoHost)).is_err());
    }

    #[test]
    fn test_add_nodes() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        let b = graph.add_gain(-3.0).unwrap();
        let c = graph.add_mixer(2).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.node_ids(), vec![a, b, c]);
        assert_eq!(graph.node_kind(a).unwrap(), NodeKind::Splitter);
        assert_eq!(graph.node_kind(b).unwrap(), NodeKind::Gain { db: -3.0 });
        assert_eq!(graph.node_kind(c).unwrap(), NodeKind::Mixer { inputs: 2 });
    }

    #[test]
    fn test_add_external_not_found() {
        let graph = graph();
        let result = graph.add_external("reverb", None);
        assert!(matches!(result, Err(GraphError::NotFound(_))));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_add_mixer_zero_inputs_rejected() {
        let graph = graph();
        assert!(matches!(
            graph.add_mixer(0),
            Err(GraphError::InvalidArgument(_))
        ));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_connect_and_edges() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        let b = graph.add_gain(0.0).unwrap();
        graph.connect(a, b).unwrap();

        assert_eq!(graph.edges(), vec![(a, b)]);
        assert_eq!(graph.source_of(b).unwrap(), Some(a));
        assert_eq!(graph.source_of(a).unwrap(), None);
    }

    #[test]
    fn test_connect_invalid_handle() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        let other = Graph::new(48000.0, 256, Box::new(NoHost)).unwrap();
        other.add_splitter().unwrap();
        let foreign = other.add_splitter().unwrap();

        assert!(matches!(
            graph.connect(a, foreign),
            Err(GraphError::InvalidNode(_))
        ));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_disconnect_mismatch_keeps_edge() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        let b = graph.add_splitter().unwrap();
        let c = graph.add_splitter().unwrap();
        graph.connect(a, c).unwrap();

        assert!(matches!(
            graph.disconnect(b, c),
            Err(GraphError::NotConnected { .. })
        ));
        assert_eq!(graph.source_of(c).unwrap(), Some(a));

        graph.disconnect(a, c).unwrap();
        assert_eq!(graph.source_of(c).unwrap(), None);
    }

    #[test]
    fn test_io_nodes() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        let b = graph.add_gain(0.0).unwrap();
        assert_eq!(graph.io_nodes(), (None, None));

        graph.set_io_nodes(Some(a), Some(b)).unwrap();
        assert_eq!(graph.io_nodes(), (Some(a), Some(b)));

        graph.set_io_nodes(None, Some(b)).unwrap();
        assert_eq!(graph.io_nodes(), (None, Some(b)));
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let graph = graph();
        let a = graph.add_splitter().unwrap();
        graph.set_io_nodes(Some(a), Some(a)).unwrap();
        graph.clear();

        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.io_nodes(), (None, None));
        assert!(!graph.contains(a));

        let b = graph.add_splitter().unwrap();
        assert_eq!(b.index(), 0);
        assert!(matches!(
            graph.node_kind(a),
            Err(GraphError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_mixer_gain_access() {
        let graph = graph();
        let mixer = graph.add_mixer(3).unwrap();
        let gain = graph.add_gain(0.0).unwrap();

        assert_eq!(graph.mixer_gain(mixer, 2).unwrap(), 1.0);
        graph.set_mixer_gain(mixer, 2, 0.25).unwrap();
        assert_eq!(graph.mixer_gain(mixer, 2).unwrap(), 0.25);

        assert!(graph.set_mixer_gain(mixer, 3, 1.0).is_err());
        assert!(graph.set_mixer_gain(mixer, 0, f32::NAN).is_err());
        assert!(graph.mixer_gain(gain, 0).is_err());
    }

    #[test]
    fn test_retired_topologies_are_released() {
        let graph = graph();
        for _ in 0..10 {
            graph.add_splitter().unwrap();
        }
        // Nothing holds the replaced topologies, so none are kept.
        assert!(graph.editor.lock().retired.is_empty());
    }

    #[test]
    fn test_release_retired_once_unheld() {
        let graph = graph();
        graph.add_gain(0.0).unwrap();
        let held = graph.shared.load_full();
        graph.clear();
        assert_eq!(graph.release_retired(), 1);

        drop(held);
        assert_eq!(graph.release_retired(), 0);
    }

    #[test]
    fn test_renderer_keeps_topology_alive() {
        let graph = graph();
        let a = graph.add_gain(0.0).unwrap();
        let held = graph.shared.load_full();
        graph.clear();
        graph.add_splitter().unwrap();

        // The cleared node is still reachable through the held topology.
        assert_eq!(held.nodes.len(), 1);
        assert_eq!(held.nodes[0].id, a);
        assert!(
            graph
                .editor
                .lock()
                .retired
                .iter()
                .any(|t| Arc::ptr_eq(t, &held))
        );
    }
}
