//! Error types for catalog verification with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::ResourceKind;

/// Boxed source error for failures raised by HTTP and other collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Catalog verification errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A source URL does not point at a supported repository
    #[error("Invalid repository URL '{url}': {reason}\n\nExpected a URL of the form https://github.com/<owner>/<repo>")]
    InvalidSourceUrl { url: String, reason: String },

    /// A kind label is not one of the recognized resource kinds
    #[error("Unknown resource kind '{label}'\n\nSupported kinds are: tasks, pipelines")]
    UnknownKind { label: String },

    /// The externals configuration is unusable
    #[error("Invalid externals configuration: {0}")]
    Config(String),

    /// Failed to read the externals configuration file
    #[error("Failed to read externals configuration from {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the externals configuration file
    #[error("Failed to parse externals configuration {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Transport-level failure while talking to a remote host
    #[error("Failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The remote host answered with a non-success status
    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Failed to read a catalog contract from disk
    #[error("Failed to read catalog contract {path}")]
    ContractRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A catalog contract did not decode into the expected structure
    #[error("Failed to decode catalog contract {location}")]
    Decode {
        location: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// A contract asset of one release could not be loaded
    #[error("Failed to load asset {asset} from {tag}")]
    AssetLoad {
        asset: String,
        tag: String,
        #[source]
        source: Box<CatalogError>,
    },

    /// Same kind and name declared by two different origins
    #[error("two resources of kind '{kind}' have the same name '{name}' from different sources\n  source1: {existing}\n  source2: {incoming}")]
    CrossSourceCollision {
        kind: ResourceKind,
        name: String,
        existing: String,
        incoming: String,
    },

    /// Same kind, name and version declared twice by one origin
    #[error("two resources of kind '{kind}' have the same name '{name}' and version '{version}' from the same source '{origin}'")]
    DuplicateVersionCollision {
        kind: ResourceKind,
        name: String,
        version: String,
        origin: String,
    },

    /// A release carries no catalog contract asset (strict mode only)
    #[error("Release '{tag}' of '{source_name}' has no catalog contract asset (expected '{expected}')")]
    MissingManifest {
        source_name: String,
        tag: String,
        expected: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    /// Whether this error is one of the two namespace collision classes
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            CatalogError::CrossSourceCollision { .. }
                | CatalogError::DuplicateVersionCollision { .. }
        )
    }

    /// Whether this error points at a caller or configuration defect
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidSourceUrl { .. }
                | CatalogError::UnknownKind { .. }
                | CatalogError::Config(_)
                | CatalogError::ConfigRead { .. }
                | CatalogError::ConfigParse { .. }
        )
    }

    /// Log namespace collisions on a dedicated target
    pub fn log_if_collision(&self) {
        if self.is_collision() {
            tracing::error!(target: "conflicts", "NAME CONFLICT: {}", self);
        }
    }
}
