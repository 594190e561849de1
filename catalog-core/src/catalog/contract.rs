//! Catalog contract parsing (catalog.yaml)
//!
//! A contract is published as a release asset and lists every resource the
//! release ships, grouped by kind, with its version and optional file
//! metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CatalogError, Result};

/// Default contract file name
pub const CONTRACT_FILENAME: &str = "catalog.yaml";

/// Legacy contract file name, still accepted for older releases
pub const LEGACY_CONTRACT_FILENAME: &str = "catalog.yml";

/// Resource kinds partitioning the catalog namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Tasks,
    Pipelines,
}

impl ResourceKind {
    /// All recognized kinds, in reporting order
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Tasks, ResourceKind::Pipelines];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Tasks => "tasks",
            ResourceKind::Pipelines => "pipelines",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tasks" => Ok(ResourceKind::Tasks),
            "pipelines" => Ok(ResourceKind::Pipelines),
            other => Err(CatalogError::UnknownKind {
                label: other.to_string(),
            }),
        }
    }
}

/// A catalog contract (catalog.yaml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Contract format version
    #[serde(default, deserialize_with = "version_text")]
    pub version: String,

    /// Catalog section
    #[serde(default)]
    pub catalog: CatalogSection,
}

/// The `catalog` section of a contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    #[serde(default)]
    pub resources: Resources,
}

/// Resources declared by a contract, per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub tasks: Vec<ResourceDeclaration>,

    #[serde(default)]
    pub pipelines: Vec<ResourceDeclaration>,
}

/// A single versioned resource declared by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Resource name, unique per kind across the merged namespace
    pub name: String,

    /// Version string (not required to be semver)
    #[serde(default, deserialize_with = "version_text")]
    pub version: String,

    /// Path of the resource file inside the release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Checksum of the resource file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl ResourceDeclaration {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            filename: None,
            checksum: None,
        }
    }
}

/// Read a version as the scalar text written in the document
///
/// Unquoted scalars keep their spelling (`1.10` stays `1.10`). A missing or
/// null version reads as an empty string.
fn version_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Contract {
    /// Load a contract from a file, or from `catalog.yaml` inside a directory
    pub fn from_file(path: &Path) -> Result<Self> {
        let path = Self::resolve_path(path);
        let content =
            std::fs::read_to_string(&path).map_err(|source| CatalogError::ContractRead {
                path: path.clone(),
                source,
            })?;

        Self::from_yaml(&content).map_err(|err| match err {
            CatalogError::Decode { source, .. } => CatalogError::Decode {
                location: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse a contract from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).map_err(|source| CatalogError::Decode {
            location: "<inline>".to_string(),
            source,
        })
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|source| CatalogError::Decode {
            location: "<inline>".to_string(),
            source,
        })
    }

    /// Declarations of one kind, in document order
    pub fn resources(&self, kind: ResourceKind) -> &[ResourceDeclaration] {
        match kind {
            ResourceKind::Tasks => &self.catalog.resources.tasks,
            ResourceKind::Pipelines => &self.catalog.resources.pipelines,
        }
    }

    /// Mutable access to the declarations of one kind
    pub fn resources_mut(&mut self, kind: ResourceKind) -> &mut Vec<ResourceDeclaration> {
        match kind {
            ResourceKind::Tasks => &mut self.catalog.resources.tasks,
            ResourceKind::Pipelines => &mut self.catalog.resources.pipelines,
        }
    }

    /// Total number of declarations across all kinds
    pub fn resource_count(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.resources(*kind).len())
            .sum()
    }

    fn resolve_path(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(CONTRACT_FILENAME)
        } else {
            path.to_path_buf()
        }
    }
}
