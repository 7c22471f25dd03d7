//! Hook event payload

use descrefly_dbt::ManifestMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Properties describing one hook run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookProperties {
    /// Exit status returned by the hook
    #[serde(rename = "Status")]
    pub status: i32,

    /// Human-readable description of the hook
    #[serde(rename = "Description")]
    pub description: String,

    /// One entry per reported problem
    #[serde(rename = "Error Messages")]
    pub error_messages: Vec<String>,
}

/// Project context taken from manifest metadata
///
/// The project id is hashed before it leaves the machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbt_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
}

impl ManifestContext {
    /// Build the context from manifest metadata
    pub fn from_metadata(metadata: &ManifestMetadata) -> Self {
        Self {
            dbt_version: metadata.dbt_version.clone(),
            adapter_type: metadata.adapter_type.clone(),
            project_id: metadata.project_id.as_deref().map(hash_identifier),
            user_id: metadata.user_id.clone(),
            invocation_id: metadata.invocation_id.clone(),
        }
    }
}

/// sha256 hex digest of an identifier
pub fn hash_identifier(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// A hook event as sent to the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    pub hook_name: String,
    pub hook_properties: HookProperties,
    pub manifest: ManifestContext,
}

impl HookEvent {
    /// Create an event for a hook run against a manifest
    pub fn new(
        hook_name: impl Into<String>,
        hook_properties: HookProperties,
        metadata: &ManifestMetadata,
    ) -> Self {
        Self {
            hook_name: hook_name.into(),
            hook_properties,
            manifest: ManifestContext::from_metadata(metadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn properties() -> HookProperties {
        HookProperties {
            status: 1,
            description: "Check the model has description.".to_string(),
            error_messages: vec!["models/orders.sql: missing".to_string()],
        }
    }

    #[test]
    fn payload_uses_display_keys() {
        let event = HookEvent::new("check-model-has-description", properties(), &ManifestMetadata::default());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["hook_name"], "check-model-has-description");
        assert_eq!(json["hook_properties"]["Status"], 1);
        assert_eq!(json["hook_properties"]["Error Messages"][0], "models/orders.sql: missing");
        assert_eq!(json["manifest"], serde_json::json!({}));
    }

    #[test]
    fn project_id_is_hashed() {
        let metadata = ManifestMetadata {
            project_id: Some("jaffle_shop".to_string()),
            dbt_version: Some("1.7.4".to_string()),
            ..ManifestMetadata::default()
        };
        let context = ManifestContext::from_metadata(&metadata);

        let hashed = context.project_id.unwrap();
        assert_eq!(hashed.len(), 64);
        assert_ne!(hashed, "jaffle_shop");
        assert_eq!(hashed, hash_identifier("jaffle_shop"));
        assert_eq!(context.dbt_version.as_deref(), Some("1.7.4"));
    }
}
