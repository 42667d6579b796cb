//! End-to-end tests for the ambiance-core graph.
//!
//! Builds small graphs through the public API, renders blocks, and checks the
//! output against expected levels.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use ambiance_core::{
    ControlError, Graph, GraphError, HostError, NoHost, NodeKind, NodeTarget, ProcessError,
    ProcessingUnit, RenderError, UnitControl, UnitHost, UnitRequest, db_to_linear,
};

const SAMPLE_RATE: f32 = 48000.0;
const MAX_BLOCK: usize = 512;

/// Renders one block of constant `level` on both channels, returning the left output.
fn render(graph: &Graph, level: f32, frames: usize) -> Vec<f32> {
    let input = vec![level; frames];
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    graph.process(&input, &input, &mut left, &mut right).unwrap();
    assert_eq!(left, right, "mono input must render identical channels");
    left
}

fn splitter_into_gain(db: f32) -> (Graph, ambiance_core::NodeId, ambiance_core::NodeId) {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(NoHost)).unwrap();
    let split = graph.add_splitter().unwrap();
    let gain = graph.add_gain(db).unwrap();
    graph.connect(split, gain).unwrap();
    graph.set_io_nodes(Some(split), Some(gain)).unwrap();
    (graph, split, gain)
}

// ---------------------------------------------------------------------------
// Rendering scenarios
// ---------------------------------------------------------------------------

#[test]
fn unity_gain_passes_input_through() {
    let (graph, split, gain) = splitter_into_gain(0.0);
    assert_eq!(split.index(), 0);
    assert_eq!(gain.index(), 1);

    let out = render(&graph, 0.5, MAX_BLOCK);
    assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
}

#[test]
fn normalized_zero_attenuates_by_sixty_db() {
    let (graph, _, gain) = splitter_into_gain(0.0);
    graph.set_param(gain, 0, 0.0).unwrap();

    let out = render(&graph, 0.5, MAX_BLOCK);
    let expected = 0.5 * db_to_linear(-60.0);
    assert!(out.iter().all(|&s| (s - expected).abs() < 1e-6));
    assert!((out[0] / 0.5 - 0.001).abs() < 1e-5);
}

#[test]
fn mixer_hears_only_the_last_connected_source() {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(NoHost)).unwrap();
    let split = graph.add_splitter().unwrap();
    let quiet = graph.add_gain(-60.0).unwrap();
    let mixer = graph.add_mixer(3).unwrap();
    let loud = graph.add_gain(-6.0).unwrap();
    graph.connect(split, quiet).unwrap();
    graph.connect(split, loud).unwrap();

    graph.connect(quiet, mixer).unwrap();
    graph.connect(loud, mixer).unwrap();
    graph.set_io_nodes(Some(split), Some(mixer)).unwrap();

    assert_eq!(graph.source_of(mixer).unwrap(), Some(loud));
    let out = render(&graph, 1.0, 64);
    let expected = db_to_linear(-6.0);
    assert!((out[0] - expected).abs() < 1e-5, "got {}", out[0]);
}

#[test]
fn long_chain_multiplies_gains() {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(NoHost)).unwrap();
    let input = graph.add_splitter().unwrap();
    let mut previous = input;
    for _ in 0..20 {
        let gain = graph.add_gain(-1.0).unwrap();
        graph.connect(previous, gain).unwrap();
        previous = gain;
    }
    graph.set_io_nodes(Some(input), Some(previous)).unwrap();

    let out = render(&graph, 1.0, 128);
    assert!((out[0] - db_to_linear(-20.0)).abs() < 1e-4);
}

#[test]
fn dependency_order_overrides_creation_order() {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(NoHost)).unwrap();
    // Created output first, input last.
    let out_gain = graph.add_gain(-6.0).unwrap();
    let mid = graph.add_gain(-6.0).unwrap();
    let input = graph.add_splitter().unwrap();
    graph.connect(input, mid).unwrap();
    graph.connect(mid, out_gain).unwrap();
    graph.set_io_nodes(Some(input), Some(out_gain)).unwrap();

    let out = render(&graph, 1.0, 32);
    assert!((out[0] - db_to_linear(-12.0)).abs() < 1e-5);
}

#[test]
fn disconnected_output_is_silent() {
    let (graph, split, gain) = splitter_into_gain(0.0);
    graph.disconnect(split, gain).unwrap();
    let out = render(&graph, 1.0, 32);
    assert!(out.iter().all(|&s| s == 0.0));
}

// ---------------------------------------------------------------------------
// Handles and topology
// ---------------------------------------------------------------------------

#[test]
fn stale_handles_fail_after_clear() {
    let (graph, split, gain) = splitter_into_gain(0.0);
    graph.clear();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.io_nodes(), (None, None));

    let fresh = graph.add_splitter().unwrap();
    assert_eq!(fresh.index(), split.index());
    assert_ne!(fresh, split);

    assert!(matches!(graph.connect(fresh, gain), Err(GraphError::InvalidNode(_))));
    assert!(matches!(graph.set_param(gain, 0, 0.5), Err(GraphError::InvalidNode(_))));
    assert!(matches!(graph.node_kind(split), Err(GraphError::InvalidNode(_))));
}

#[test]
fn failed_edits_leave_graph_unchanged() {
    let (graph, split, gain) = splitter_into_gain(-3.0);
    let before = graph.snapshot();

    assert!(graph.add_mixer(0).is_err());
    assert!(graph.add_gain(f32::INFINITY).is_err());
    assert!(matches!(
        graph.connect(gain, split),
        Err(GraphError::CycleDetected { .. })
    ));
    assert!(matches!(
        graph.disconnect(gain, split),
        Err(GraphError::NotConnected { .. })
    ));
    assert!(matches!(
        graph.add_external("missing", None),
        Err(GraphError::NotFound(HostError::NotFound(_)))
    ));

    assert_eq!(graph.snapshot(), before);
}

#[test]
fn queries_reflect_topology() {
    let (graph, split, gain) = splitter_into_gain(-3.0);
    let mixer = graph.add_mixer(2).unwrap();
    graph.connect(gain, mixer).unwrap();

    assert_eq!(graph.node_ids(), vec![split, gain, mixer]);
    assert_eq!(graph.edges(), vec![(split, gain), (gain, mixer)]);
    assert_eq!(graph.io_nodes(), (Some(split), Some(gain)));
    assert_eq!(graph.node_kind(mixer).unwrap(), NodeKind::Mixer { inputs: 2 });
    assert_eq!(graph.source_of(split).unwrap(), None);
}

// ---------------------------------------------------------------------------
// Snapshot and restore
// ---------------------------------------------------------------------------

#[test]
fn restored_graph_renders_identically() {
    let (graph, _, gain) = splitter_into_gain(0.0);
    graph.set_param(gain, 0, 0.75).unwrap();
    let reference = render(&graph, 0.7, 256);

    let snapshot = graph.snapshot();
    let copy = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(NoHost)).unwrap();
    copy.restore(&snapshot).unwrap();

    assert_eq!(render(&copy, 0.7, 256), reference);
}

// ---------------------------------------------------------------------------
// Event routing
// ---------------------------------------------------------------------------

/// Records the last note-on pitch and toggles a gate.
struct Voice {
    gate: Arc<VoiceControl>,
}

#[derive(Default)]
struct VoiceControl {
    open: AtomicBool,
    pitch: AtomicU32,
}

impl UnitControl for VoiceControl {
    fn note_on(&self, _channel: u8, pitch: u8, _velocity: f32) -> Result<(), ControlError> {
        self.pitch.store(u32::from(pitch), Ordering::Relaxed);
        self.open.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn note_off(&self, _channel: u8, _pitch: u8, _velocity: f32) -> Result<(), ControlError> {
        self.open.store(false, Ordering::Relaxed);
        Ok(())
    }
}

impl ProcessingUnit for Voice {
    fn process(
        &mut self,
        _left_in: &[f32],
        _right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        let level = if self.gate.open.load(Ordering::Relaxed) { 1.0 } else { 0.0 };
        left_out.fill(level);
        right_out.fill(level);
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.gate.clone()
    }
}

struct VoiceHost;

impl UnitHost for VoiceHost {
    fn instantiate(
        &mut self,
        request: &UnitRequest<'_>,
    ) -> Result<Box<dyn ProcessingUnit>, HostError> {
        match request.locator {
            "voice" => Ok(Box::new(Voice {
                gate: Arc::new(VoiceControl::default()),
            })),
            other => Err(HostError::NotFound(other.to_owned())),
        }
    }
}

#[test]
fn notes_gate_an_instrument() {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(VoiceHost)).unwrap();
    let voice = graph.add_external("voice", None).unwrap();
    let gain = graph.add_gain(-6.0).unwrap();
    graph.connect(voice, gain).unwrap();

    assert!(render(&graph, 0.0, 16).iter().all(|&s| s == 0.0));

    graph.note_on(voice, 0, 69, 1.0).unwrap();
    let out = render(&graph, 0.0, 16);
    assert!((out[0] - db_to_linear(-6.0)).abs() < 1e-5);

    graph.note_off(NodeTarget::All, 0, 69, 0.0).unwrap();
    assert!(render(&graph, 0.0, 16).iter().all(|&s| s == 0.0));
}

#[test]
fn broadcast_reaches_every_instrument() {
    let graph = Graph::new(SAMPLE_RATE, MAX_BLOCK, Box::new(VoiceHost)).unwrap();
    let a = graph.add_external("voice", None).unwrap();
    let b = graph.add_external("voice", None).unwrap();
    let mixer = graph.add_mixer(1).unwrap();
    graph.connect(b, mixer).unwrap();

    graph.note_on(NodeTarget::All, 0, 60, 1.0).unwrap();
    assert!((render(&graph, 0.0, 8)[0] - 1.0).abs() < 1e-6);

    graph.set_io_nodes(None, Some(a)).unwrap();
    assert!((render(&graph, 0.0, 8)[0] - 1.0).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn render_thread_survives_concurrent_edits() {
    let graph = Arc::new(Graph::new(SAMPLE_RATE, 256, Box::new(NoHost)).unwrap());
    let renderer = graph.renderer();
    let stop = Arc::new(AtomicBool::new(false));

    let audio = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let input = [0.25f32; 256];
            let mut left = [0.0f32; 256];
            let mut right = [0.0f32; 256];
            let mut blocks = 0usize;
            while !stop.load(Ordering::Relaxed) {
                match renderer.process(&input, &input, &mut left, &mut right) {
                    Ok(()) => {
                        assert!(left.iter().all(|s| s.is_finite() && s.abs() <= 0.25 + 1e-6));
                    }
                    Err(RenderError::Busy) => {}
                    Err(err) => panic!("unexpected render error: {err}"),
                }
                blocks += 1;
            }
            blocks
        })
    };

    for round in 0..200 {
        let split = graph.add_splitter().unwrap();
        let gain = graph.add_gain(-(round % 60) as f32).unwrap();
        graph.connect(split, gain).unwrap();
        graph.set_io_nodes(Some(split), Some(gain)).unwrap();
        graph.set_param(gain, 0, 0.5).unwrap();
        if round % 10 == 9 {
            graph.clear();
        }
    }

    stop.store(true, Ordering::Relaxed);
    let blocks = audio.join().unwrap();
    assert!(blocks > 0);
}

#[test]
fn parameter_writes_from_another_thread_are_visible() {
    let (graph, _, gain) = splitter_into_gain(0.0);
    let graph = Arc::new(graph);

    let writer = {
        let graph = Arc::clone(&graph);
        thread::spawn(move || graph.set_param(gain, 0, 0.5))
    };
    writer.join().unwrap().unwrap();

    let out = render(&graph, 1.0, 16);
    assert!((out[0] - db_to_linear(-30.0)).abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Counts live units and remembers the thread that dropped the last one.
#[derive(Default)]
struct Lifetimes {
    live: AtomicUsize,
    dropped_on: Mutex<Option<ThreadId>>,
}

struct Tracked {
    lifetimes: Arc<Lifetimes>,
    control: Arc<VoiceControl>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.lifetimes.live.fetch_sub(1, Ordering::SeqCst);
        *self.lifetimes.dropped_on.lock().unwrap() = Some(thread::current().id());
    }
}

impl ProcessingUnit for Tracked {
    fn process(
        &mut self,
        _left_in: &[f32],
        _right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) -> Result<(), ProcessError> {
        left_out.fill(0.5);
        right_out.fill(0.5);
        Ok(())
    }

    fn control(&self) -> Arc<dyn UnitControl> {
        self.control.clone()
    }
}

struct TrackedHost(Arc<Lifetimes>);

impl UnitHost for TrackedHost {
    fn instantiate(
        &mut self,
        _request: &UnitRequest<'_>,
    ) -> Result<Box<dyn ProcessingUnit>, HostError> {
        self.0.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Tracked {
            lifetimes: Arc::clone(&self.0),
            control: Arc::new(VoiceControl::default()),
        }))
    }
}

fn tracked_graph(lifetimes: &Arc<Lifetimes>) -> Graph {
    Graph::new(SAMPLE_RATE, 64, Box::new(TrackedHost(Arc::clone(lifetimes)))).unwrap()
}

#[test]
fn dropping_the_graph_releases_units_while_a_renderer_lives() {
    let lifetimes = Arc::new(Lifetimes::default());
    let graph = tracked_graph(&lifetimes);
    let a = graph.add_external("tracked", None).unwrap();
    let b = graph.add_external("tracked", None).unwrap();
    graph.connect(a, b).unwrap();
    let renderer = graph.renderer();
    assert_eq!(lifetimes.live.load(Ordering::SeqCst), 2);

    let input = [0.0f32; 64];
    let (mut left, mut right) = ([0.0f32; 64], [0.0f32; 64]);
    renderer.process(&input, &input, &mut left, &mut right).unwrap();
    assert_eq!(left, [0.5; 64]);

    drop(graph);
    assert_eq!(lifetimes.live.load(Ordering::SeqCst), 0);
    assert_eq!(
        *lifetimes.dropped_on.lock().unwrap(),
        Some(thread::current().id())
    );

    renderer.process(&input, &input, &mut left, &mut right).unwrap();
    assert_eq!(left, [0.0; 64]);
}

#[test]
fn dropping_the_graph_waits_for_a_running_render_thread() {
    let lifetimes = Arc::new(Lifetimes::default());
    let graph = tracked_graph(&lifetimes);
    for _ in 0..4 {
        graph.add_external("tracked", None).unwrap();
    }
    let renderer = graph.renderer();
    let stop = Arc::new(AtomicBool::new(false));

    let audio = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let input = [0.0f32; 64];
            let (mut left, mut right) = ([0.0f32; 64], [0.0f32; 64]);
            while !stop.load(Ordering::Relaxed) {
                let _ = renderer.process(&input, &input, &mut left, &mut right);
            }
            thread::current().id()
        })
    };

    thread::sleep(std::time::Duration::from_millis(5));
    drop(graph);
    assert_eq!(lifetimes.live.load(Ordering::SeqCst), 0);

    stop.store(true, Ordering::Relaxed);
    let audio_thread = audio.join().unwrap();
    assert_ne!(*lifetimes.dropped_on.lock().unwrap(), Some(audio_thread));
}

#[test]
fn removed_units_are_released_without_another_edit() {
    let lifetimes = Arc::new(Lifetimes::default());
    let graph = tracked_graph(&lifetimes);
    graph.add_external("tracked", None).unwrap();
    graph.clear();
    assert_eq!(graph.release_retired(), 0);
    assert_eq!(lifetimes.live.load(Ordering::SeqCst), 0);
}
