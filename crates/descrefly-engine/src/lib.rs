//! Hook engine
//!
//! This crate implements:
//! - Description coverage: changed models must be documented in the
//!   manifest or in a schema file
//! - Model properties generation: skeleton properties entries for changed
//!   models that have none yet

pub mod description;
pub mod properties;

pub use description::{DescriptionCheck, DescriptionCoverage, MissingDescription, compute_missing};
pub use properties::{GenerationReport, PropertiesGenerator, PropertiesOutcome, PropertiesError, PlannedProperties, PathTemplate};
