//! catalog-cd commands
//!
//! Verifies that the catalogs published by several repositories can share
//! one namespace, fetches the contracts of a single repository, and checks a
//! local contract before it is published.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use catalog_core::catalog::{Contract, ExternalsConfig, Registry, ResourceKind, CONTRACT_FILENAME};
use catalog_core::fetch::fetch_contracts;
use catalog_core::github::{GitHubClient, DEFAULT_API_BASE};
use catalog_core::verify::{check_contract, VerifyOptions, VerifyReport, Verifier};

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Verify that all configured repositories merge without name conflicts
    VerifyNameConflicts {
        /// Externals configuration listing the repositories to verify
        #[clap(long)]
        config: PathBuf,

        /// Name of the contract asset attached to each release
        #[clap(long, default_value = CONTRACT_FILENAME)]
        catalog_name: String,

        /// Fail on releases that carry no contract asset
        #[clap(long)]
        strict: bool,

        /// Output the merged namespace as JSON
        #[clap(long)]
        json: bool,

        /// GitHub API base URL (for enterprise hosts)
        #[clap(long, default_value = DEFAULT_API_BASE)]
        api_base: String,
    },

    /// Fetch the contract of every published release of a repository
    Fetch {
        /// Repository URL (https://github.com/<owner>/<repo>)
        #[clap(long)]
        url: String,

        /// Name of the contract asset attached to each release
        #[clap(long, default_value = CONTRACT_FILENAME)]
        catalog_name: String,

        /// Output the contracts as JSON
        #[clap(long)]
        json: bool,

        /// GitHub API base URL (for enterprise hosts)
        #[clap(long, default_value = DEFAULT_API_BASE)]
        api_base: String,
    },

    /// Check a local contract for duplicate declarations before publishing
    Check {
        /// Path to a contract file or a directory containing catalog.yaml
        path: PathBuf,
    },
}

impl CatalogCommand {
    pub async fn execute(self) -> Result<()> {
        match self {
            CatalogCommand::VerifyNameConflicts {
                config,
                catalog_name,
                strict,
                json,
                api_base,
            } => execute_verify(&config, catalog_name, strict, json, &api_base).await,
            CatalogCommand::Fetch {
                url,
                catalog_name,
                json,
                api_base,
            } => execute_fetch(&url, &catalog_name, json, &api_base).await,
            CatalogCommand::Check { path } => execute_check(&path),
        }
    }
}

/// Table row for the merged namespace
#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Versions")]
    versions: String,
    #[tabled(rename = "Source")]
    source: String,
}

fn namespace_rows(registry: &Registry) -> Vec<NamespaceRow> {
    ResourceKind::ALL
        .iter()
        .flat_map(|kind| {
            registry.entries(*kind).map(move |(name, entry)| NamespaceRow {
                kind: kind.to_string(),
                name: name.to_string(),
                versions: entry
                    .versions()
                    .iter()
                    .map(|v| v.version.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                source: entry.origin().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
}

async fn execute_verify(
    config: &Path,
    catalog_name: String,
    strict: bool,
    json: bool,
    api_base: &str,
) -> Result<()> {
    let externals = ExternalsConfig::load_from_path(config)?;
    let sources = externals
        .sources()
        .with_context(|| format!("Invalid repositories in {}", config.display()))?;

    let client = GitHubClient::with_api_base(api_base)?;
    let options = VerifyOptions::default()
        .with_catalog_name(catalog_name)
        .with_strict_assets(strict);
    let verifier = Verifier::with_options(&client, &client, options);

    let report = verifier.verify(&sources).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report, sources.len());
    Ok(())
}

fn print_report(report: &VerifyReport, source_count: usize) {
    let rows = namespace_rows(&report.registry);
    if !rows.is_empty() {
        print_table(&rows);
    }

    println!(
        "\nNo name conflicts across {} sources ({} contracts, {} resources, {} versions)",
        source_count,
        report.contracts,
        report.registry.len(),
        report.registry.version_count()
    );

    if !report.skipped.is_empty() {
        println!("Skipped {} releases:", report.skipped.len());
        for skipped in &report.skipped {
            println!(
                "  {} ({}) {} - {:?}",
                skipped.source, skipped.kind, skipped.tag, skipped.reason
            );
        }
    }
}

/// Table row for fetched contracts
#[derive(Tabled)]
struct ContractRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Tasks")]
    tasks: usize,
    #[tabled(rename = "Pipelines")]
    pipelines: usize,
}

async fn execute_fetch(url: &str, catalog_name: &str, json: bool, api_base: &str) -> Result<()> {
    let client = GitHubClient::with_api_base(api_base)?;
    let contracts = fetch_contracts(&client, &client, url, catalog_name)
        .await
        .with_context(|| format!("Failed to fetch contracts from {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&contracts)?);
        return Ok(());
    }

    if contracts.is_empty() {
        println!("No published contracts found in {url}");
        return Ok(());
    }

    let rows: Vec<ContractRow> = contracts
        .iter()
        .map(|tagged| ContractRow {
            tag: tagged.tag.clone(),
            tasks: tagged.contract.resources(ResourceKind::Tasks).len(),
            pipelines: tagged.contract.resources(ResourceKind::Pipelines).len(),
        })
        .collect();

    print_table(&rows);
    Ok(())
}

fn execute_check(path: &Path) -> Result<()> {
    let contract = Contract::from_file(path)?;
    let origin = path.display().to_string();

    let registry = check_contract(&contract, &origin)
        .with_context(|| format!("Contract {origin} declares conflicting resources"))?;

    println!("✓ {origin} is valid");
    for kind in ResourceKind::ALL {
        println!("  {}: {}", kind, registry.resource_count(kind));
    }

    Ok(())
}
