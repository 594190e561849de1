//! Fetch every published contract of one repository

use serde::Serialize;

use crate::catalog::{Contract, LEGACY_CONTRACT_FILENAME};
use crate::error::{CatalogError, Result};
use crate::github::{AssetFetcher, ReleaseLocator, RepositoryRef};
use crate::verify::download_contract;

/// A contract together with the release tag it was published under
#[derive(Debug, Clone, Serialize)]
pub struct TaggedContract {
    pub tag: String,
    pub contract: Contract,
}

/// Download and decode the contract of every published release
///
/// Drafts and pre-releases are ignored, as are releases that carry neither
/// `catalog_name` nor the legacy `catalog.yml`. Contracts are returned in
/// release listing order.
pub async fn fetch_contracts<L, F>(
    locator: &L,
    fetcher: &F,
    url: &str,
    catalog_name: &str,
) -> Result<Vec<TaggedContract>>
where
    L: ReleaseLocator + ?Sized,
    F: AssetFetcher + ?Sized,
{
    let repository = RepositoryRef::parse(url)?;
    let releases = locator.list_releases(&repository).await?;
    let work_dir = tempfile::Builder::new().prefix("catalog-cd-").tempdir()?;
    let asset_names = [catalog_name, LEGACY_CONTRACT_FILENAME];

    let mut contracts = Vec::new();
    for (index, release) in releases.iter().enumerate() {
        if release.is_unpublished() {
            tracing::debug!("Ignoring unpublished release '{}'", release.tag_name);
            continue;
        }

        let Some(asset) = release.find_asset(&asset_names) else {
            tracing::debug!("Release '{}' has no contract asset", release.tag_name);
            continue;
        };

        let dest = work_dir.path().join(format!("{index}-{}", asset.name));
        let contract = download_contract(fetcher, asset, &dest)
            .await
            .map_err(|err| CatalogError::AssetLoad {
                asset: asset.name.clone(),
                tag: release.tag_name.clone(),
                source: Box::new(err),
            })?;

        contracts.push(TaggedContract {
            tag: release.tag_name.clone(),
            contract,
        });
    }

    work_dir.close()?;
    tracing::info!(
        "Fetched {} contracts from {}",
        contracts.len(),
        repository.slug()
    );
    Ok(contracts)
}
