//! HTTP client for the GitHub releases API

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{AssetFetcher, Release, ReleaseLocator, RepositoryRef};
use crate::error::{CatalogError, Result};

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Request timeout for listings and downloads
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from the release listing (the API maximum)
pub const RELEASES_PER_PAGE: usize = 100;

/// Release listing and asset download over HTTP
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    /// Create a client for the public GitHub API
    pub fn new() -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Create a client against a different API base (enterprise hosts, tests)
    pub fn with_api_base(api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("catalog-cd/", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Fetch {
                url: api_base.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the release listing for a repository
    pub fn releases_url(&self, repository: &RepositoryRef) -> String {
        format!("{}/{}", self.api_base, repository.releases_path())
    }

    /// URL of one page of the release listing, counting from 1
    pub fn releases_page_url(&self, repository: &RepositoryRef, page: usize) -> String {
        format!(
            "{}?per_page={}&page={}",
            self.releases_url(repository),
            RELEASES_PER_PAGE,
            page
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Fetch {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ReleaseLocator for GitHubClient {
    async fn list_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>> {
        let mut releases = Vec::new();

        // A short page is the last one
        for page in 1.. {
            let url = self.releases_page_url(repository, page);
            tracing::debug!("Listing releases from {}", url);

            let batch: Vec<Release> =
                self.get(&url)
                    .await?
                    .json()
                    .await
                    .map_err(|e| CatalogError::Fetch {
                        url: url.clone(),
                        source: Box::new(e),
                    })?;

            let last = batch.len() < RELEASES_PER_PAGE;
            releases.extend(batch);
            if last {
                break;
            }
        }

        tracing::debug!("Found {} releases for {}", releases.len(), repository.slug());
        Ok(releases)
    }
}

#[async_trait]
impl AssetFetcher for GitHubClient {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!("Downloading {} to {}", url, dest.display());

        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| CatalogError::Fetch {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}
