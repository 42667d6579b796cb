//! Engine settings and the session graph, stored as TOML.

use std::path::Path;

use ambiance_core::{Graph, GraphSnapshot, UnitHost};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Largest accepted block size in frames.
pub const MAX_BLOCK_FRAMES: usize = 8192;

/// Engine configuration.
///
/// Every field has a default, so a partial file (or an empty one) loads.
///
/// ```rust
/// use ambiance_config::EngineConfig;
///
/// let config = EngineConfig::from_toml("sample_rate = 44100").unwrap();
/// assert_eq!(config.sample_rate, 44100);
/// assert_eq!(config.max_block_frames, 512);
/// assert!(config.graph.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Largest block the device will render, in frames.
    pub max_block_frames: usize,
    /// `tracing` filter directive, e.g. `"info,ambiance_core=debug"`.
    pub log_filter: String,
    /// Session graph restored by [`EngineConfig::build_graph`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphSnapshot>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            max_block_frames: 512,
            log_filter: "info".to_string(),
            graph: None,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "engine config saved");
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every setting, including the session graph's indices.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!(
                    "{} Hz is outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                    self.sample_rate
                ),
            ));
        }
        if !(1..=MAX_BLOCK_FRAMES).contains(&self.max_block_frames) {
            return Err(ConfigError::invalid(
                "max_block_frames",
                format!(
                    "{} frames is outside 1..={MAX_BLOCK_FRAMES}",
                    self.max_block_frames
                ),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid("log_filter", "must not be empty"));
        }
        if let Some(graph) = &self.graph {
            graph.validate()?;
        }
        Ok(())
    }

    /// Validate, create a graph with `host`, and restore the session graph.
    pub fn build_graph(&self, host: Box<dyn UnitHost>) -> Result<Graph, ConfigError> {
        self.validate()?;
        let graph = Graph::new(self.sample_rate as f32, self.max_block_frames, host)?;
        if let Some(snapshot) = &self.graph {
            graph.restore(snapshot)?;
        }
        tracing::info!(
            sample_rate = self.sample_rate,
            max_block_frames = self.max_block_frames,
            nodes = graph.node_count(),
            "graph built"
        );
        Ok(graph)
    }

    /// Store `graph`'s current state as the session graph.
    pub fn capture(&mut self, graph: &Graph) {
        self.graph = Some(graph.snapshot());
    }
}
