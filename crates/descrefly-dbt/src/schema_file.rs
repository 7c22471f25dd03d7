//! YAML schema (properties) files
//!
//! Only the `models:` list matters here. Entries that are not mappings or
//! have no `name` are ignored, as dbt itself would reject them later.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A parsed schema file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Properties file format version (dbt uses 2)
    #[serde(default)]
    pub version: Option<serde_yaml::Value>,

    /// Raw `models:` items
    #[serde(default)]
    pub models: Vec<serde_yaml::Value>,
}

/// Model-level properties declared in a schema file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(default)]
    pub name: Option<String>,

    /// Any YAML value; dbt renders non-string scalars as text
    #[serde(default)]
    pub description: Option<serde_yaml::Value>,
}

impl ModelEntry {
    /// Whether the entry carries a non-blank description
    pub fn has_description(&self) -> bool {
        self.description.as_ref().is_some_and(is_present)
    }
}

fn is_present(value: &serde_yaml::Value) -> bool {
    use serde_yaml::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_present(&tagged.value),
    }
}

impl SchemaFile {
    /// Load a schema file from disk
    pub fn from_file(path: &Path) -> Result<Self, SchemaFileError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SchemaFileError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
            .map_err(|e| SchemaFileError::ParseError(path.display().to_string(), e.to_string()))
    }

    /// Parse a schema file from YAML text; an empty document has no models
    pub fn from_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// Named model entries, skipping malformed items
    pub fn model_entries(&self) -> impl Iterator<Item = (String, ModelEntry)> + '_ {
        self.models.iter().filter_map(|item| {
            if !item.is_mapping() {
                return None;
            }
            let entry: ModelEntry = serde_yaml::from_value(item.clone()).ok()?;
            let name = entry.name.clone().filter(|n| !n.is_empty())?;
            Some((name, entry))
        })
    }
}

/// A schema-file entry for one of the changed models
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub model_name: String,
    pub file: PathBuf,
    pub entry: ModelEntry,
}

/// Collect entries for models in `filenames` from every schema file
///
/// Files that fail to load are returned alongside instead of aborting.
pub fn model_schemas(
    yml_files: &[PathBuf],
    filenames: &BTreeSet<String>,
) -> (Vec<ModelSchema>, Vec<SchemaFileError>) {
    let mut schemas = Vec::new();
    let mut errors = Vec::new();

    for path in yml_files {
        let file = match SchemaFile::from_file(path) {
            Ok(file) => file,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        schemas.extend(
            file.model_entries()
                .filter(|(name, _)| filenames.contains(name))
                .map(|(model_name, entry)| ModelSchema {
                    model_name,
                    file: path.clone(),
                    entry,
                }),
        );
    }

    (schemas, errors)
}

/// Schema file errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaFileError {
    #[error("Failed to read schema file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse schema file {0}: {1}")]
    ParseError(String, String),
}

impl SchemaFileError {
    /// Path of the offending file
    pub fn path(&self) -> &str {
        match self {
            Self::IoError(path, _) | Self::ParseError(path, _) => path,
        }
    }
}
