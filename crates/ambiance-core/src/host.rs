//! Host collaborator used to resolve external units.
//!
//! A [`Graph`](crate::Graph) owns exactly one [`UnitHost`], passed at
//! construction. The graph never touches files or plugin formats itself: it hands
//! the host a [`UnitRequest`] and receives a ready-to-run unit or a
//! [`HostError`].

use crate::error::HostError;
use crate::unit::ProcessingUnit;

/// Everything a host needs to instantiate and activate a unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitRequest<'a> {
    /// Locator of the unit (a path, URI, or registry id; host-defined).
    pub locator: &'a str,
    /// Optional variant selector within the locator.
    pub variant: Option<&'a str>,
    /// Sample rate the graph runs at.
    pub sample_rate: f32,
    /// Largest block the unit will be asked to process.
    pub max_block_frames: usize,
}

/// Resolves locators to activated processing units.
pub trait UnitHost: Send {
    /// Instantiates and activates a unit.
    ///
    /// On error nothing is left allocated on the host's side.
    fn instantiate(
        &mut self,
        request: &UnitRequest<'_>,
    ) -> Result<Box<dyn ProcessingUnit>, HostError>;
}

/// A host that resolves nothing.
///
/// For graphs built only from mixers, splitters, and gain stages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl UnitHost for NoHost {
    fn instantiate(
        &mut self,
        request: &UnitRequest<'_>,
    ) -> Result<Box<dyn ProcessingUnit>, HostError> {
        Err(HostError::NotFound(request.locator.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_host_resolves_nothing() {
        let mut host = NoHost;
        let request = UnitRequest {
            locator: "plugins/reverb.vst3",
            variant: None,
            sample_rate: 48000.0,
            max_block_frames: 512,
        };
        let err = host.instantiate(&request).err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("no unit found for locator 'plugins/reverb.vst3'")
        );
    }
}
