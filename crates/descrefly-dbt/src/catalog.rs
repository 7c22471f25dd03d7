//! dbt catalog.json parsing
//!
//! `dbt docs generate` writes the warehouse column layout of every
//! relation to catalog.json. Only column names and positions are used.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// dbt catalog.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Relations keyed by node unique_id
    #[serde(default)]
    pub nodes: HashMap<String, CatalogNode>,
}

impl Catalog {
    /// Load catalog from file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse catalog from JSON string
    pub fn from_str(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json)
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    /// Get a relation by node unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&CatalogNode> {
        self.nodes.get(unique_id)
    }
}

/// A relation in the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    /// Columns keyed by their warehouse name
    #[serde(default)]
    pub columns: HashMap<String, CatalogColumn>,
}

impl CatalogNode {
    /// Lower-cased column names in warehouse order
    pub fn column_names(&self) -> Vec<String> {
        let mut columns: Vec<(&String, &CatalogColumn)> = self
            .columns
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .collect();

        columns.sort_by(|(a_key, a), (b_key, b)| {
            a.index
                .unwrap_or(u32::MAX)
                .cmp(&b.index.unwrap_or(u32::MAX))
                .then_with(|| a_key.cmp(b_key))
        });

        columns
            .into_iter()
            .map(|(key, _)| key.to_lowercase())
            .collect()
    }
}

/// A column in a catalog relation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
    #[serde(default)]
    pub name: Option<String>,

    /// 1-based position in the relation
    #[serde(default)]
    pub index: Option<u32>,

    /// Warehouse data type
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
}

/// Catalog parsing errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse catalog JSON: {0}")]
    ParseError(String),
}
