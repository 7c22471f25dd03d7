//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract model nodes and the
//! project metadata used for telemetry context.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::files::file_stem;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    #[serde(default)]
    pub metadata: ManifestMetadata,

    /// Model, test, seed and snapshot nodes keyed by unique_id
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Get all model nodes (filters out tests, seeds, etc.), ordered by unique_id
    pub fn models(&self) -> BTreeMap<&str, &ManifestNode> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_model())
            .map(|(id, node)| (id.as_str(), node))
            .collect()
    }

    /// Get a specific node by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes.get(unique_id)
    }

    /// Model nodes whose SQL file name (without extension) is in `filenames`
    ///
    /// Ephemeral models are only returned when `include_ephemeral` is set.
    pub fn model_refs<'a>(
        &'a self,
        filenames: &BTreeSet<String>,
        include_ephemeral: bool,
    ) -> Vec<ModelRef<'a>> {
        self.models()
            .into_iter()
            .filter(|(_, node)| include_ephemeral || !node.is_ephemeral())
            .filter_map(|(unique_id, node)| {
                let filename = node.filename();
                filenames.contains(&filename).then_some(ModelRef {
                    unique_id,
                    filename,
                    node,
                })
            })
            .collect()
    }

    /// File names of all non-ephemeral models
    pub fn model_filenames(&self) -> BTreeSet<String> {
        self.models()
            .values()
            .filter(|node| !node.is_ephemeral())
            .map(|node| node.filename())
            .collect()
    }
}

/// Manifest metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub dbt_schema_version: Option<String>,
    #[serde(default)]
    pub dbt_version: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub invocation_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub send_anonymous_usage_stats: Option<bool>,
    #[serde(default)]
    pub adapter_type: Option<String>,
}

/// A node in the manifest (model, test, snapshot, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.my_project.users")
    #[serde(default)]
    pub unique_id: String,

    /// Node name (e.g., "users")
    pub name: String,

    /// Resource type (model, test, snapshot, etc.)
    pub resource_type: String,

    /// Relative path to SQL file (within the models directory)
    #[serde(default)]
    pub path: String,

    /// Original file path (relative to the project root)
    #[serde(default)]
    pub original_file_path: String,

    /// Properties file that documents this node, if any
    #[serde(default)]
    pub patch_path: Option<String>,

    /// Database name
    #[serde(default)]
    pub database: Option<String>,

    /// Schema name
    #[serde(default)]
    pub schema: Option<String>,

    /// Alias (output table name)
    #[serde(default)]
    pub alias: Option<String>,

    /// Node configuration
    #[serde(default)]
    pub config: NodeConfig,

    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

impl ManifestNode {
    /// Whether this node is a model
    pub fn is_model(&self) -> bool {
        self.resource_type == "model"
    }

    /// Whether this model is materialized as ephemeral
    pub fn is_ephemeral(&self) -> bool {
        self.config.materialized.as_deref() == Some("ephemeral")
    }

    /// Whether the node carries a non-blank description
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// SQL file name without extension; falls back to the node name
    pub fn filename(&self) -> String {
        [self.original_file_path.as_str(), self.path.as_str()]
            .into_iter()
            .find(|p| !p.is_empty())
            .and_then(|p| file_stem(Path::new(p)))
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Node configuration (from dbt_project.yml or model config)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Materialization type
    #[serde(default)]
    pub materialized: Option<String>,
}

/// A changed model together with its manifest node
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRef<'a> {
    pub unique_id: &'a str,
    pub filename: String,
    pub node: &'a ManifestNode,
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "metadata": {
            "dbt_version": "1.7.4",
            "project_id": "098f6bcd4621d373cade4e832627b4f6",
            "adapter_type": "postgres",
            "send_anonymous_usage_stats": true
        },
        "nodes": {
            "model.shop.customers": {
                "unique_id": "model.shop.customers",
                "name": "customers",
                "resource_type": "model",
                "path": "customers.sql",
                "original_file_path": "models/customers.sql",
                "description": "One row per customer",
                "config": {"materialized": "table"}
            },
            "model.shop.orders": {
                "unique_id": "model.shop.orders",
                "name": "orders",
                "resource_type": "model",
                "path": "marts/orders.sql",
                "original_file_path": "models/marts/orders.sql",
                "description": ""
            },
            "model.shop.stg_payments": {
                "name": "stg_payments",
                "resource_type": "model",
                "original_file_path": "models/staging/stg_payments.sql",
                "config": {"materialized": "ephemeral"}
            },
            "test.shop.not_null_orders_id": {
                "name": "not_null_orders_id",
                "resource_type": "test",
                "original_file_path": "models/schema.yml"
            }
        }
    }"#;

    #[test]
    fn parse_minimal_manifest() {
        let manifest = Manifest::from_str(MANIFEST).unwrap();

        assert_eq!(manifest.metadata.dbt_version.as_deref(), Some("1.7.4"));
        assert_eq!(manifest.nodes.len(), 4);
        assert_eq!(manifest.models().len(), 3);

        let customers = manifest.get_node("model.shop.customers").unwrap();
        assert!(customers.has_description());
        assert_eq!(customers.filename(), "customers");

        let orders = manifest.get_node("model.shop.orders").unwrap();
        assert!(!orders.has_description());
    }

    #[test]
    fn null_and_blank_descriptions_are_missing() {
        let manifest = Manifest::from_str(
            r#"{"nodes": {
                "model.p.a": {"name": "a", "resource_type": "model", "description": null},
                "model.p.b": {"name": "b", "resource_type": "model", "description": "   "}
            }}"#,
        )
        .unwrap();

        assert!(manifest.nodes.values().all(|n| !n.has_description()));
    }

    #[test]
    fn model_refs_match_file_stems() {
        let manifest = Manifest::from_str(MANIFEST).unwrap();
        let filenames: BTreeSet<String> = ["orders", "stg_payments", "not_null_orders_id", "unknown"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let refs = manifest.model_refs(&filenames, false);
        let ids: Vec<&str> = refs.iter().map(|r| r.unique_id).collect();
        assert_eq!(ids, vec!["model.shop.orders"]);

        let with_ephemeral = manifest.model_refs(&filenames, true);
        assert_eq!(with_ephemeral.len(), 2);
    }

    #[test]
    fn model_filenames_skip_ephemeral() {
        let manifest = Manifest::from_str(MANIFEST).unwrap();
        let names: Vec<String> = manifest.model_filenames().into_iter().collect();
        assert_eq!(names, vec!["customers".to_string(), "orders".to_string()]);
    }

    #[test]
    fn filename_falls_back_to_name() {
        let node: ManifestNode =
            serde_json::from_str(r#"{"name": "bare", "resource_type": "model"}"#).unwrap();
        assert_eq!(node.filename(), "bare");
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let err = Manifest::from_str("{\"nodes\": ").unwrap_err();
        assert!(matches!(err, ManifestError::ParseError(_)));
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let err = Manifest::from_file(Path::new("does/not/exist/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::IoError(_, _)));
    }
}
