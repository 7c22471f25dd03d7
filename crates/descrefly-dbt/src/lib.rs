//! dbt artifact parsing
//!
//! This crate handles:
//! - Parsing manifest.json and catalog.json (dbt-generated artifacts)
//! - Reading model entries from YAML schema (properties) files
//! - Splitting the changed paths handed over by pre-commit

pub mod manifest;
pub mod catalog;
pub mod schema_file;
pub mod files;

pub use manifest::{Manifest, ManifestNode, ManifestMetadata, NodeConfig, ModelRef, ManifestError};
pub use catalog::{Catalog, CatalogNode, CatalogColumn, CatalogError};
pub use schema_file::{SchemaFile, ModelEntry, ModelSchema, SchemaFileError, model_schemas};
pub use files::{ChangedFiles, file_stem, filenames_with_extensions, has_extension};
