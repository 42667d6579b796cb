//! Integration tests for ambiance-registry hosted in a graph.

use ambiance_core::{Graph, GraphError, HostError, NodeKind, NodeTarget};
use ambiance_registry::{DELAY_MIX, DELAY_TIME, TONE_LEVEL, UnitRegistry};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 256;

fn graph() -> Graph {
    Graph::new(SAMPLE_RATE, BLOCK, Box::new(UnitRegistry::new())).unwrap()
}

fn peak(graph: &Graph) -> f32 {
    let silence = [0.0f32; BLOCK];
    let (mut left, mut right) = ([0.0f32; BLOCK], [0.0f32; BLOCK]);
    graph.process(&silence, &silence, &mut left, &mut right).unwrap();
    left.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

#[test]
fn tone_plays_through_delay() {
    let graph = graph();
    let tone = graph.add_external("tone", Some("square")).unwrap();
    let delay = graph.add_external("delay", None).unwrap();
    graph.connect(tone, delay).unwrap();
    graph.set_param(tone, TONE_LEVEL, 1.0).unwrap();
    graph.set_param(delay, DELAY_MIX, 0.0).unwrap();

    assert_eq!(peak(&graph), 0.0);

    graph.note_on(NodeTarget::All, 0, 57, 0.8).unwrap();
    assert!((peak(&graph) - 0.8).abs() < 1e-5);

    graph.note_off(tone, 0, 57, 0.0).unwrap();
    assert_eq!(peak(&graph), 0.0);
}

#[test]
fn unknown_units_are_not_found() {
    let graph = graph();
    assert!(matches!(
        graph.add_external("reverb", None),
        Err(GraphError::NotFound(HostError::NotFound(_)))
    ));
    assert!(matches!(
        graph.add_external("tone", Some("saw")),
        Err(GraphError::NotFound(HostError::UnknownVariant { .. }))
    ));
    assert_eq!(graph.node_count(), 0);
}

#[test]
fn hosted_params_are_exposed() {
    let graph = graph();
    let delay = graph.add_external("delay", None).unwrap();
    assert_eq!(graph.param_count(delay).unwrap(), 3);
    assert_eq!(graph.param_info(delay, 0).unwrap().name, "Time");
    assert_eq!(graph.node_latency(delay).unwrap(), 0);
    assert_eq!(graph.latency_samples(), 0);

    graph.set_param(delay, DELAY_TIME, 0.5).unwrap();
    assert!((graph.get_param(delay, DELAY_TIME).unwrap() - 0.5).abs() < 1e-6);
}

#[test]
fn snapshot_carries_hosted_params() {
    let graph = graph();
    let tone = graph.add_external("tone", None).unwrap();
    let delay = graph.add_external("delay", None).unwrap();
    graph.connect(tone, delay).unwrap();
    graph.set_param(delay, DELAY_MIX, 0.25).unwrap();

    let snapshot = graph.snapshot();
    assert_eq!(
        snapshot.nodes[1].kind,
        NodeKind::External {
            locator: "delay".into(),
            variant: None
        }
    );
    assert_eq!(snapshot.nodes[1].params.len(), 3);

    let copy = Graph::new(SAMPLE_RATE, BLOCK, Box::new(UnitRegistry::new())).unwrap();
    let ids = copy.restore(&snapshot).unwrap();
    assert!((copy.get_param(ids[1], DELAY_MIX).unwrap() - 0.25).abs() < 1e-6);
    let restored = copy.snapshot();
    assert_eq!(restored.edges, snapshot.edges);
    for (a, b) in restored.nodes.iter().zip(&snapshot.nodes) {
        assert_eq!(a.kind, b.kind);
        for (pa, pb) in a.params.iter().zip(&b.params) {
            assert_eq!(pa.id, pb.id);
            assert!((pa.value - pb.value).abs() < 1e-5);
        }
    }
}
