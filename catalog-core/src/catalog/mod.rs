//! Catalog contracts and the merged resource namespace
//!
//! This module provides the data model shared by every command:
//!
//! - [`Contract`]: a decoded `catalog.yaml` release asset
//! - [`ExternalsConfig`]: the list of repositories to aggregate
//! - [`Merger`] and [`Registry`]: the namespace built from many contracts
//!
//! # Architecture
//!
//! ```text
//! externals.yaml ──► Source (repo, kind) ──► releases ──► catalog.yaml
//!                                                             │
//!                                                             ▼
//!                                           Merger::ingest(kind, name, version, origin)
//!                                                             │
//!                                                             ▼
//!                                               Registry  or  collision error
//! ```

mod contract;
mod externals;
mod merger;
mod registry;

pub use contract::{
    CatalogSection, Contract, ResourceDeclaration, ResourceKind, Resources, CONTRACT_FILENAME,
    LEGACY_CONTRACT_FILENAME,
};
pub use externals::{ExternalRepository, ExternalsConfig, Source};
pub use merger::Merger;
pub use registry::{Registry, RegistryEntry, ResourceVersion};
