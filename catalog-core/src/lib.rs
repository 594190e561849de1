//! catalog-cd core library
//!
//! Aggregates catalog contracts published as GitHub release assets and
//! verifies that their combined resource namespace is free of name conflicts.

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod github;
pub mod verify;

pub use error::{CatalogError, Result};
