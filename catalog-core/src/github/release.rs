//! Release listing types and the collaborator traits used by verification
//!
//! [`ReleaseLocator`] and [`AssetFetcher`] are the seams between the
//! verification driver and the network. [`GitHubClient`](super::GitHubClient)
//! implements both; tests swap in in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::RepositoryRef;
use crate::error::Result;

/// A tagged release as returned by the GitHub releases API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub name: Option<String>,

    pub tag_name: String,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub prerelease: bool,

    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable asset attached to a release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,

    /// Public download location, used as the origin of every declaration
    /// decoded from this asset
    pub browser_download_url: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            browser_download_url: browser_download_url.into(),
        }
    }
}

impl Release {
    pub fn new(tag_name: impl Into<String>, assets: Vec<Asset>) -> Self {
        Self {
            tag_name: tag_name.into(),
            assets,
            ..Default::default()
        }
    }

    /// Find the first asset whose name is one of `names`
    pub fn find_asset(&self, names: &[&str]) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|asset| names.contains(&asset.name.as_str()))
    }

    /// Whether this release is a draft or a pre-release
    pub fn is_unpublished(&self) -> bool {
        self.draft || self.prerelease
    }
}

/// Lists the releases of a repository
#[async_trait]
pub trait ReleaseLocator: Send + Sync {
    /// Releases in the order the host returns them
    async fn list_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>>;
}

/// Downloads a release asset to local storage
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Write the bytes found at `url` to `dest`
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

#[async_trait]
impl<T: ReleaseLocator + ?Sized> ReleaseLocator for &T {
    async fn list_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>> {
        (**self).list_releases(repository).await
    }
}

#[async_trait]
impl<T: AssetFetcher + ?Sized> AssetFetcher for &T {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        (**self).download(url, dest).await
    }
}
