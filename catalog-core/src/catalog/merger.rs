//! Namespace merging and conflict detection
//!
//! Declarations are ingested one at a time. A name is accepted when it is new
//! to its kind, or when it comes from the same origin as before with a version
//! not yet seen. Anything else is a collision and ends the run.

use super::{Contract, Registry, ResourceKind};
use crate::error::{CatalogError, Result};

/// Builds a [`Registry`] and enforces the name uniqueness rules
#[derive(Debug, Default)]
pub struct Merger {
    registry: Registry,
}

impl Merger {
    /// Create a merger with an empty registry
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Record one declaration, failing on the first collision
    pub fn ingest(
        &mut self,
        kind: ResourceKind,
        name: &str,
        version: &str,
        origin: &str,
    ) -> Result<()> {
        let Some(entry) = self.registry.entry_mut(kind, name) else {
            tracing::trace!(%kind, name, version, origin, "New resource");
            self.registry.insert_new(kind, name, version, origin);
            return Ok(());
        };

        // Every stored pair shares this origin, so the first one is enough
        let existing = entry.origin().unwrap_or_default();
        if existing != origin {
            return Err(CatalogError::CrossSourceCollision {
                kind,
                name: name.to_string(),
                existing: existing.to_string(),
                incoming: origin.to_string(),
            });
        }

        if entry.has_version(version) {
            return Err(CatalogError::DuplicateVersionCollision {
                kind,
                name: name.to_string(),
                version: version.to_string(),
                origin: origin.to_string(),
            });
        }

        tracing::trace!(%kind, name, version, origin, "Additional version");
        entry.push(version, origin);
        Ok(())
    }

    /// Ingest every declaration of `kind` from a contract, in document order
    ///
    /// Returns the number of declarations ingested.
    pub fn ingest_contract(
        &mut self,
        contract: &Contract,
        kind: ResourceKind,
        origin: &str,
    ) -> Result<usize> {
        let resources = contract.resources(kind);
        for resource in resources {
            self.ingest(kind, &resource.name, &resource.version, origin)?;
        }
        Ok(resources.len())
    }

    /// Read-only view of the namespace built so far
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consume the merger and return the validated namespace
    pub fn into_registry(self) -> Registry {
        self.registry
    }
}
