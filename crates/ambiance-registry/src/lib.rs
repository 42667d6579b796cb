//! Unit registry and factory for ambiance processing graphs.
//!
//! This crate provides a [`UnitHost`] that resolves locators to processing units
//! from a table of registered factories. It ships two built-in units and provides
//! metadata for building user interfaces.
//!
//! # Features
//!
//! - **Unit Discovery**: List all available units with metadata
//! - **Factory Pattern**: Create units by locator and variant at runtime
//! - **Category System**: Units organized by type (instrument, time-based, ...)
//!
//! # Example
//!
//! ```rust
//! use ambiance_core::Graph;
//! use ambiance_registry::{UnitCategory, UnitRegistry};
//!
//! let registry = UnitRegistry::new();
//!
//! // List all units
//! for unit in registry.all_units() {
//!     println!("{}: {}", unit.id, unit.description);
//! }
//!
//! // Filter by category
//! for unit in registry.units_in_category(UnitCategory::Instrument) {
//!     println!("Instrument: {}", unit.name);
//! }
//!
//! // Host units in a graph
//! let graph = Graph::new(48000.0, 256, Box::new(registry))?;
//! let tone = graph.add_external("tone", Some("square"))?;
//! let delay = graph.add_external("delay", None)?;
//! graph.connect(tone, delay)?;
//! graph.note_on(tone, 0, 60, 1.0)?;
//! # Ok::<(), ambiance_core::GraphError>(())
//! ```

pub mod delay;
pub mod tone;

pub use delay::{DELAY_FEEDBACK, DELAY_MIX, DELAY_TIME, Delay, DelayControl};
pub use tone::{TONE_DETUNE, TONE_LEVEL, Tone, ToneControl, Waveform};

use ambiance_core::{HostError, ProcessingUnit, UnitHost, UnitRequest};

/// Category of unit for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    /// Note-driven sound sources
    Instrument,
    /// Time-based effects (delay, reverb)
    TimeBased,
    /// Utility processors
    Utility,
}

impl UnitCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            UnitCategory::Instrument => "Instrument",
            UnitCategory::TimeBased => "Time-Based",
            UnitCategory::Utility => "Utility",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            UnitCategory::Instrument => "Oscillators and other note-driven sound sources",
            UnitCategory::TimeBased => "Delay, reverb, and other time-based effects",
            UnitCategory::Utility => "Gain stages, routing, and utility processors",
        }
    }
}

/// Describes a unit in the registry.
#[derive(Debug, Clone)]
pub struct UnitDescriptor {
    /// Locator the unit is resolved by (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the unit.
    pub description: &'static str,
    /// Category for organization.
    pub category: UnitCategory,
    /// Number of parameters.
    pub param_count: usize,
    /// Accepted variant selectors. The first is used when none is given.
    pub variants: &'static [&'static str],
}

/// Factory function type for creating units.
///
/// Receives the full request, so it can read the variant and activation
/// settings.
pub type UnitFactory = fn(&UnitRequest<'_>) -> Result<Box<dyn ProcessingUnit>, HostError>;

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: UnitDescriptor,
    factory: UnitFactory,
}

/// Registry of available processing units.
///
/// Both built-in units are registered by [`UnitRegistry::new`]; more can be
/// added with [`UnitRegistry::register`]. Pass the registry to
/// [`Graph::new`](ambiance_core::Graph::new) as the graph's host.
pub struct UnitRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Create a new registry with the built-in units registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_units();
        registry
    }

    /// Create a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn register_builtin_units(&mut self) {
        // Tone
        self.register(
            UnitDescriptor {
                id: "tone",
                name: "Tone",
                description: "Monophonic note-driven oscillator",
                category: UnitCategory::Instrument,
                param_count: 2,
                variants: &["sine", "square"],
            },
            |request| {
                let waveform = Waveform::from_variant(request.variant).ok_or_else(|| {
                    HostError::UnknownVariant {
                        locator: request.locator.to_owned(),
                        variant: request.variant.unwrap_or_default().to_owned(),
                    }
                })?;
                Ok(Box::new(Tone::new(request.sample_rate, waveform)))
            },
        );

        // Delay
        self.register(
            UnitDescriptor {
                id: "delay",
                name: "Delay",
                description: "Stereo feedback delay",
                category: UnitCategory::TimeBased,
                param_count: 3,
                variants: &[],
            },
            |request| Ok(Box::new(Delay::new(request.sample_rate))),
        );
    }

    /// Register a unit. Lookups return the first entry with a matching id.
    pub fn register(&mut self, descriptor: UnitDescriptor, factory: UnitFactory) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Returns descriptors for all registered units.
    pub fn all_units(&self) -> Vec<&UnitDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for units in a specific category.
    pub fn units_in_category(&self, category: UnitCategory) -> Vec<&UnitDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by locator.
    pub fn get(&self, id: &str) -> Option<&UnitDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// Returns the number of registered units.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no units are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }
}

impl UnitHost for UnitRegistry {
    fn instantiate(
        &mut self,
        request: &UnitRequest<'_>,
    ) -> Result<Box<dyn ProcessingUnit>, HostError> {
        let entry = self
            .entry(request.locator)
            .ok_or_else(|| HostError::NotFound(request.locator.to_owned()))?;

        if let Some(variant) = request.variant
            && !entry.descriptor.variants.iter().any(|v| *v == variant)
        {
            return Err(HostError::UnknownVariant {
                locator: request.locator.to_owned(),
                variant: variant.to_owned(),
            });
        }

        (entry.factory)(request)
    }
}
