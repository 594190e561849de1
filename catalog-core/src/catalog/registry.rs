//! Merged resource namespace
//!
//! The registry records, per kind and resource name, every version seen so
//! far together with the origin it was downloaded from. It is built by the
//! [`Merger`](super::Merger) during one verification run and is never
//! persisted.

use serde::Serialize;
use std::collections::BTreeMap;

use super::ResourceKind;

/// One observed `(version, origin)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceVersion {
    pub version: String,
    pub origin: String,
}

/// Everything known about one resource name within one kind
///
/// Once the merger has accepted an entry, all of its versions share one
/// origin and no version appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    versions: Vec<ResourceVersion>,
}

impl RegistryEntry {
    fn new(version: &str, origin: &str) -> Self {
        Self {
            versions: vec![ResourceVersion {
                version: version.to_string(),
                origin: origin.to_string(),
            }],
        }
    }

    /// Origin shared by every stored version
    pub fn origin(&self) -> Option<&str> {
        self.versions.first().map(|v| v.origin.as_str())
    }

    /// All observed versions, in ingestion order
    pub fn versions(&self) -> &[ResourceVersion] {
        &self.versions
    }

    /// Whether `version` has already been recorded
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    pub(super) fn push(&mut self, version: &str, origin: &str) {
        self.versions.push(ResourceVersion {
            version: version.to_string(),
            origin: origin.to_string(),
        });
    }
}

/// Kind → name → entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registry {
    kinds: BTreeMap<ResourceKind, BTreeMap<String, RegistryEntry>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with a sub-map for every recognized kind
    pub fn new() -> Self {
        let kinds = ResourceKind::ALL
            .iter()
            .map(|kind| (*kind, BTreeMap::new()))
            .collect();
        Self { kinds }
    }

    /// Look up a resource by kind and name
    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&RegistryEntry> {
        self.kinds.get(&kind).and_then(|names| names.get(name))
    }

    /// Iterate the entries of one kind, sorted by name
    pub fn entries(&self, kind: ResourceKind) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.kinds
            .get(&kind)
            .into_iter()
            .flat_map(|names| names.iter().map(|(name, entry)| (name.as_str(), entry)))
    }

    /// Number of distinct names recorded for one kind
    pub fn resource_count(&self, kind: ResourceKind) -> usize {
        self.kinds.get(&kind).map_or(0, |names| names.len())
    }

    /// Number of distinct names across all kinds
    pub fn len(&self) -> usize {
        self.kinds.values().map(|names| names.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of versions across all kinds and names
    pub fn version_count(&self) -> usize {
        self.kinds
            .values()
            .flat_map(|names| names.values())
            .map(|entry| entry.versions.len())
            .sum()
    }

    pub(super) fn entry_mut(&mut self, kind: ResourceKind, name: &str) -> Option<&mut RegistryEntry> {
        self.kinds.get_mut(&kind).and_then(|names| names.get_mut(name))
    }

    pub(super) fn insert_new(&mut self, kind: ResourceKind, name: &str, version: &str, origin: &str) {
        self.kinds
            .entry(kind)
            .or_default()
            .insert(name.to_string(), RegistryEntry::new(version, origin));
    }
}
