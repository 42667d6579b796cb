//! Configuration and session files for ambiance processing graphs.
//!
//! This crate loads and saves the engine settings a device collaborator needs to
//! construct a [`Graph`](ambiance_core::Graph), together with an optional session
//! graph restored into it.
//!
//! # Features
//!
//! - **Engine Settings**: Sample rate, maximum block size, and log filter
//! - **Sessions**: A [`GraphSnapshot`](ambiance_core::GraphSnapshot) stored under `[graph]`
//! - **Validation**: Range checks before any graph is built
//!
//! # Example
//!
//! ```rust,no_run
//! use ambiance_config::EngineConfig;
//! use ambiance_core::NoHost;
//!
//! let config = EngineConfig::load("engine.toml").unwrap();
//! let graph = config.build_graph(Box::new(NoHost)).unwrap();
//!
//! // ... edit the graph, then keep the session
//! let mut config = config;
//! config.capture(&graph);
//! config.save("engine.toml").unwrap();
//! ```

mod engine;
mod error;

pub use engine::{EngineConfig, MAX_BLOCK_FRAMES, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use error::ConfigError;
