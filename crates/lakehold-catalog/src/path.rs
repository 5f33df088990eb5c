//! Data path normalization.
//!
//! Every data path the catalog stores ends in the path separator of its
//! location, so file paths can be built by plain concatenation. Remote paths
//! additionally require the storage capability that serves their scheme.

use std::collections::BTreeSet;

use lakehold_core::{StorageCapability, StorageLocation};

use crate::error::{BootstrapError, Result};
use crate::state::CatalogState;

/// Source of truth for which storage capabilities the session can use.
pub trait CapabilityRegistry: Send + Sync {
    /// Makes `capability` available if possible and reports whether it is.
    fn ensure(&self, capability: StorageCapability) -> bool;
}

/// Fixed set of available capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    available: BTreeSet<StorageCapability>,
}

impl StaticCapabilities {
    /// No remote storage: only local paths are accepted.
    #[must_use]
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Every known capability.
    #[must_use]
    pub fn all() -> Self {
        Self::with([
            StorageCapability::S3,
            StorageCapability::Gcs,
            StorageCapability::Azure,
            StorageCapability::Http,
            StorageCapability::HuggingFace,
        ])
    }

    /// Exactly the given capabilities.
    #[must_use]
    pub fn with(capabilities: impl IntoIterator<Item = StorageCapability>) -> Self {
        Self {
            available: capabilities.into_iter().collect(),
        }
    }
}

impl CapabilityRegistry for StaticCapabilities {
    fn ensure(&self, capability: StorageCapability) -> bool {
        self.available.contains(&capability)
    }
}

/// Normalizes data paths against a capability registry.
#[derive(Clone, Copy)]
pub struct PathNormalizer<'a> {
    capabilities: &'a dyn CapabilityRegistry,
}

impl std::fmt::Debug for PathNormalizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathNormalizer").finish_non_exhaustive()
    }
}

impl<'a> PathNormalizer<'a> {
    /// Creates a normalizer that checks capabilities in `capabilities`.
    #[must_use]
    pub fn new(capabilities: &'a dyn CapabilityRegistry) -> Self {
        Self { capabilities }
    }

    /// Normalizes `data_path` in place and records its separator on `state`.
    ///
    /// An empty path is left untouched (resolution is deferred).
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::MissingCapability`] if the path's scheme
    /// needs a capability the registry cannot provide.
    pub fn normalize(&self, data_path: &mut String, state: &mut CatalogState) -> Result<()> {
        if data_path.is_empty() {
            return Ok(());
        }

        let location = StorageLocation::parse(data_path);
        if let Some(capability) = location.required_capability() {
            if !self.capabilities.ensure(capability) {
                return Err(BootstrapError::MissingCapability {
                    capability,
                    location: data_path.clone(),
                });
            }
        }

        let separator = location.separator();
        if !data_path.ends_with(separator) {
            data_path.push(separator);
        }
        state.set_separator(separator);
        Ok(())
    }
}
