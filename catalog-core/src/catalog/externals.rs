//! Externals configuration (externals.yaml)
//!
//! Lists the repositories whose released catalog contracts are merged into
//! one namespace. A repository may publish several kinds; it expands into one
//! [`Source`] per kind, in the order the kinds are listed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ResourceKind;
use crate::error::{CatalogError, Result};
use crate::github::RepositoryRef;

/// Externals configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalsConfig {
    /// Configured external repositories
    #[serde(default)]
    pub repositories: Vec<ExternalRepository>,
}

/// One external repository entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRepository {
    /// Symbolic name used in messages and download file names
    pub name: String,

    /// Repository web URL (e.g. https://github.com/tektoncd/catalog)
    pub url: String,

    /// Single kind label
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Several kind labels
    #[serde(default, rename = "types", skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,

    /// Release tags to skip. A tag is skipped when it occurs anywhere in this
    /// string, e.g. "v0.1.0,v0.2.0".
    #[serde(default)]
    pub ignore_versions: String,

    /// Contract asset name, overriding the run-wide default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
}

/// A validated (repository, kind) pair ready for traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub repository: RepositoryRef,
    pub kind: ResourceKind,
    pub ignore_versions: String,
    pub catalog_name: Option<String>,
}

impl Source {
    /// Build a source directly, validating the URL
    pub fn new(name: &str, url: &str, kind: ResourceKind) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            repository: RepositoryRef::parse(url)?,
            kind,
            ignore_versions: String::new(),
            catalog_name: None,
        })
    }

    pub fn with_ignore_versions(mut self, ignore_versions: &str) -> Self {
        self.ignore_versions = ignore_versions.to_string();
        self
    }

    /// Whether a release tag is excluded by `ignore_versions`
    ///
    /// The tag is looked up inside the configured string, not the other way
    /// around: with `ignore_versions = "v0.1.0 v0.2.0"` the tag `v0.1` is
    /// excluded too, and an empty tag is always excluded.
    pub fn ignores(&self, tag: &str) -> bool {
        self.ignore_versions.contains(tag)
    }

    /// Contract asset names accepted for this source, primary name first
    pub fn asset_names<'a>(&'a self, default_name: &'a str) -> [&'a str; 2] {
        [
            self.catalog_name.as_deref().unwrap_or(default_name),
            super::LEGACY_CONTRACT_FILENAME,
        ]
    }
}

impl ExternalsConfig {
    /// Load externals configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml_ng::from_str(&content).map_err(|source| CatalogError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse externals configuration from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content).map_err(|source| CatalogError::ConfigParse {
            path: "<inline>".into(),
            source,
        })
    }

    /// Validate every entry and expand it into sources, in file order
    pub fn sources(&self) -> Result<Vec<Source>> {
        if self.repositories.is_empty() {
            return Err(CatalogError::Config(
                "no repositories configured".to_string(),
            ));
        }

        let mut sources = Vec::new();
        for entry in &self.repositories {
            if entry.name.trim().is_empty() {
                return Err(CatalogError::Config(format!(
                    "repository '{}' has an empty name",
                    entry.url
                )));
            }

            let repository = RepositoryRef::parse(&entry.url)?;
            let labels: Vec<&str> = entry
                .kind
                .iter()
                .chain(entry.kinds.iter())
                .map(String::as_str)
                .collect();

            if labels.is_empty() {
                return Err(CatalogError::Config(format!(
                    "repository '{}' declares no type",
                    entry.name
                )));
            }

            let mut kinds: Vec<ResourceKind> = Vec::with_capacity(labels.len());
            for label in labels {
                let kind: ResourceKind = label.parse()?;
                if kinds.contains(&kind) {
                    tracing::debug!("Ignoring repeated type '{}' for '{}'", kind, entry.name);
                    continue;
                }
                kinds.push(kind);
                sources.push(Source {
                    name: entry.name.clone(),
                    url: entry.url.clone(),
                    repository: repository.clone(),
                    kind,
                    ignore_versions: entry.ignore_versions.clone(),
                    catalog_name: entry.catalog_name.clone(),
                });
            }
        }

        Ok(sources)
    }
}
