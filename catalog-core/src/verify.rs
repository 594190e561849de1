//! Name conflict verification across external catalogs
//!
//! For every configured source the verifier lists releases, downloads each
//! release's catalog contract into a scratch directory and feeds the
//! declarations of the source's kind to a [`Merger`]. The first collision, or
//! any fetch or decode failure, ends the run. Ingestion order is source order,
//! then release listing order, then document order.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::catalog::{Contract, Merger, Registry, ResourceKind, Source, CONTRACT_FILENAME};
use crate::error::{CatalogError, Result};
use crate::github::{Asset, AssetFetcher, Release, ReleaseLocator};

/// Options for a verification run
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Contract asset name looked up in each release
    pub catalog_name: String,

    /// Fail on releases that carry no contract asset instead of skipping them
    pub strict_assets: bool,

    /// Parent directory for the scratch directory (system temp dir if unset)
    pub work_root: Option<PathBuf>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            catalog_name: CONTRACT_FILENAME.to_string(),
            strict_assets: false,
            work_root: None,
        }
    }
}

impl VerifyOptions {
    pub fn with_catalog_name(mut self, catalog_name: impl Into<String>) -> Self {
        self.catalog_name = catalog_name.into();
        self
    }

    pub fn with_strict_assets(mut self, strict: bool) -> Self {
        self.strict_assets = strict;
        self
    }

    pub fn with_work_root(mut self, work_root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(work_root.into());
        self
    }
}

/// Why a release did not contribute to the namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Tag matched the source's ignore list
    Ignored,
    /// Release has no contract asset
    NoContract,
}

/// A release left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRelease {
    pub source: String,
    pub kind: ResourceKind,
    pub tag: String,
    pub reason: SkipReason,
}

/// Outcome of a successful verification run
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// The validated namespace
    pub registry: Registry,

    /// Number of contracts downloaded and ingested
    pub contracts: usize,

    /// Number of declarations ingested
    pub declarations: usize,

    /// Releases that were not ingested
    pub skipped: Vec<SkippedRelease>,
}

/// Drives release listing, download and ingestion for a set of sources
pub struct Verifier<L, F> {
    locator: L,
    fetcher: F,
    options: VerifyOptions,
}

impl<L: ReleaseLocator, F: AssetFetcher> Verifier<L, F> {
    pub fn new(locator: L, fetcher: F) -> Self {
        Self::with_options(locator, fetcher, VerifyOptions::default())
    }

    pub fn with_options(locator: L, fetcher: F, options: VerifyOptions) -> Self {
        Self {
            locator,
            fetcher,
            options,
        }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    /// Verify that the sources merge into one namespace without collisions
    ///
    /// The scratch directory is removed whether the run succeeds or fails.
    pub async fn verify(&self, sources: &[Source]) -> Result<VerifyReport> {
        let work_dir = self.create_work_dir()?;
        tracing::debug!("Using scratch directory {}", work_dir.path().display());

        let mut run = Run {
            merger: Merger::new(),
            contracts: 0,
            declarations: 0,
            skipped: Vec::new(),
        };

        for source in sources {
            if let Err(err) = self.verify_source(source, work_dir.path(), &mut run).await {
                err.log_if_collision();
                return Err(err);
            }
        }

        work_dir.close()?;

        let registry = run.merger.into_registry();
        tracing::info!(
            "Verified {} sources: {} resources, {} versions, no conflicts",
            sources.len(),
            registry.len(),
            registry.version_count()
        );

        Ok(VerifyReport {
            registry,
            contracts: run.contracts,
            declarations: run.declarations,
            skipped: run.skipped,
        })
    }

    async fn verify_source(&self, source: &Source, work_dir: &Path, run: &mut Run) -> Result<()> {
        tracing::info!(
            "Checking {} from '{}' ({})",
            source.kind,
            source.name,
            source.repository.slug()
        );

        let releases = self.locator.list_releases(&source.repository).await?;
        let asset_names = source.asset_names(&self.options.catalog_name);

        for release in &releases {
            if source.ignores(&release.tag_name) {
                tracing::debug!("Ignoring release '{}' of '{}'", release.tag_name, source.name);
                run.skip(source, release, SkipReason::Ignored);
                continue;
            }

            let Some(asset) = release.find_asset(&asset_names) else {
                if self.options.strict_assets {
                    return Err(CatalogError::MissingManifest {
                        source_name: source.name.clone(),
                        tag: release.tag_name.clone(),
                        expected: asset_names[0].to_string(),
                    });
                }
                // Releases without a contract are not part of the catalog
                tracing::debug!(
                    "Release '{}' of '{}' has no contract asset, skipping",
                    release.tag_name,
                    source.name
                );
                run.skip(source, release, SkipReason::NoContract);
                continue;
            };

            let dest = work_dir.join(scratch_file_name(source, &release.tag_name));
            let contract = download_contract(&self.fetcher, asset, &dest).await?;
            let origin = asset.browser_download_url.as_str();

            let ingested = run.merger.ingest_contract(&contract, source.kind, origin)?;
            run.contracts += 1;
            run.declarations += ingested;
            tracing::debug!(
                "Ingested {} {} from '{}' {}",
                ingested,
                source.kind,
                source.name,
                release.tag_name
            );
        }

        Ok(())
    }

    fn create_work_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("catalog-cd-");

        let dir = match &self.options.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

struct Run {
    merger: Merger,
    contracts: usize,
    declarations: usize,
    skipped: Vec<SkippedRelease>,
}

impl Run {
    fn skip(&mut self, source: &Source, release: &Release, reason: SkipReason) {
        self.skipped.push(SkippedRelease {
            source: source.name.clone(),
            kind: source.kind,
            tag: release.tag_name.clone(),
            reason,
        });
    }
}

/// Download a contract asset to `dest` and decode it
pub(crate) async fn download_contract<F: AssetFetcher + ?Sized>(
    fetcher: &F,
    asset: &Asset,
    dest: &Path,
) -> Result<Contract> {
    fetcher.download(&asset.browser_download_url, dest).await?;
    Contract::from_file(dest).map_err(|err| match err {
        CatalogError::Decode { source, .. } => CatalogError::Decode {
            location: asset.browser_download_url.clone(),
            source,
        },
        other => other,
    })
}

/// `<kind>-<tag>-<name>.yaml`, restricted to characters safe in file names
fn scratch_file_name(source: &Source, tag: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };

    format!(
        "{}-{}-{}.yaml",
        source.kind,
        sanitize(tag),
        sanitize(&source.name)
    )
}

/// Check a single local contract for duplicate declarations
///
/// Every kind is merged with `origin` as the source, so only duplicate
/// name and version pairs can be reported.
pub fn check_contract(contract: &Contract, origin: &str) -> Result<Registry> {
    let mut merger = Merger::new();
    for kind in ResourceKind::ALL {
        merger.ingest_contract(contract, kind, origin)?;
    }
    Ok(merger.into_registry())
}
