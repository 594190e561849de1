//! GitHub repository references
//!
//! Source URLs are parsed with a small fixed grammar:
//!
//! ```text
//! url   := scheme host "/" owner "/" repo [".git"] ["/"]
//! scheme:= "https://" | "http://"
//! host  := "github.com" | "www.github.com"
//! ```

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Why a source URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRejection {
    MissingScheme,
    UnsupportedHost,
    MissingOwner,
    MissingRepository,
    TrailingPath,
}

impl UrlRejection {
    fn reason(&self) -> &'static str {
        match self {
            UrlRejection::MissingScheme => "URL must start with https:// or http://",
            UrlRejection::UnsupportedHost => "only github.com repositories are supported",
            UrlRejection::MissingOwner => "repository owner is missing",
            UrlRejection::MissingRepository => "repository name is missing",
            UrlRejection::TrailingPath => "URL has extra path segments after the repository",
        }
    }
}

/// An `owner/repo` pair on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Parse a repository web URL such as `https://github.com/tektoncd/catalog`
    pub fn parse(url: &str) -> Result<Self, CatalogError> {
        Self::parse_parts(url.trim()).map_err(|rejection| CatalogError::InvalidSourceUrl {
            url: url.to_string(),
            reason: rejection.reason().to_string(),
        })
    }

    fn parse_parts(url: &str) -> Result<Self, UrlRejection> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or(UrlRejection::MissingScheme)?;

        let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
        if !GITHUB_HOSTS.contains(&host.to_ascii_lowercase().as_str()) {
            return Err(UrlRejection::UnsupportedHost);
        }

        let mut segments = path.trim_end_matches('/').split('/');
        let owner = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(UrlRejection::MissingOwner)?;
        let repo = segments
            .next()
            .map(|s| s.strip_suffix(".git").unwrap_or(s))
            .filter(|s| !s.is_empty())
            .ok_or(UrlRejection::MissingRepository)?;
        if segments.next().is_some() {
            return Err(UrlRejection::TrailingPath);
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Path of the release listing relative to the API base
    pub fn releases_path(&self) -> String {
        format!("repos/{}/{}/releases", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepositoryRef {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
