//! Render demo: build a graph from engine settings, play a note, print levels.
//!
//! Run with: cargo run -p ambiance-config --example render_demo [engine.toml]
//!
//! Set `RUST_LOG` to override the config's `log_filter`.

use ambiance_config::EngineConfig;
use ambiance_core::{NodeTarget, linear_to_db};
use ambiance_registry::{DELAY_FEEDBACK, DELAY_MIX, TONE_LEVEL, UnitRegistry};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    let graph = config.build_graph(Box::new(UnitRegistry::new()))?;
    if graph.node_count() == 0 {
        tracing::info!("no session graph, building tone -> delay -> gain");
        let tone = graph.add_external("tone", None)?;
        let delay = graph.add_external("delay", None)?;
        let gain = graph.add_gain(-3.0)?;
        graph.connect(tone, delay)?;
        graph.connect(delay, gain)?;
        graph.set_param(tone, TONE_LEVEL, 0.9)?;
        graph.set_param(delay, DELAY_FEEDBACK, 0.5)?;
        graph.set_param(delay, DELAY_MIX, 0.4)?;
    }

    let frames = config.max_block_frames;
    let silence = vec![0.0f32; frames];
    let mut left = vec![0.0f32; frames];
    let mut right = vec![0.0f32; frames];
    let renderer = graph.renderer();

    graph.note_on(NodeTarget::All, 0, 60, 0.9)?;
    println!("{:>6} {:>10}", "block", "peak dB");
    for block in 0..40 {
        if block == 10 {
            graph.note_off(NodeTarget::All, 0, 60, 0.0)?;
        }
        renderer.process(&silence, &silence, &mut left, &mut right)?;
        let peak = left
            .iter()
            .chain(right.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        println!("{block:>6} {:>10.1}", linear_to_db(peak));
    }

    println!("\nlatency: {} samples", graph.latency_samples());
    let mut session = config.clone();
    session.capture(&graph);
    println!("\n{}", session.to_toml()?);
    Ok(())
}
