//! GitHub release access
//!
//! Parses repository URLs, lists releases and downloads release assets.

mod client;
mod release;
mod repository;

pub use client::{GitHubClient, DEFAULT_API_BASE, DEFAULT_TIMEOUT, RELEASES_PER_PAGE};
pub use release::{Asset, AssetFetcher, Release, ReleaseLocator};
pub use repository::{RepositoryRef, UrlRejection};
