//! Model properties generation
//!
//! Writes a skeleton properties entry (`name` plus catalog columns) for
//! every changed model that is not yet documented by any properties file.
//! The target path is a template such as `models/{schema}/{name}.yml`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};

use descrefly_core::{Diagnostic, DiagnosticCode, Location, Severity};
use descrefly_dbt::{filenames_with_extensions, has_extension, Catalog, Manifest, ModelRef};
use descrefly_dbt::files::{SQL_EXTENSIONS, YAML_EXTENSIONS};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"))
}

/// Properties file path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Variables a template may reference
    pub const VARIABLES: &'static [&'static str] = &["database", "schema", "alias", "name"];

    /// Validate that the template points at a YAML file
    pub fn new(template: impl Into<String>) -> Result<Self, PropertiesError> {
        let template = template.into();
        if !has_extension(Path::new(&template), YAML_EXTENSIONS) {
            return Err(PropertiesError::InvalidTemplate(template));
        }

        if let Some(unknown) = placeholder_regex()
            .captures_iter(&template)
            .filter_map(|caps| caps.get(1))
            .find(|name| !Self::VARIABLES.contains(&name.as_str()))
        {
            return Err(PropertiesError::UnknownTemplateVariable(unknown.as_str().to_string()));
        }

        Ok(Self(template))
    }

    /// Raw template text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute `{variable}` placeholders
    pub fn render(&self, model: &str, vars: &BTreeMap<&str, String>) -> Result<PathBuf, PropertiesError> {
        let mut rendered = String::with_capacity(self.0.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(&self.0) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let value = vars.get(name.as_str()).ok_or_else(|| PropertiesError::MissingTemplateVariable {
                variable: name.as_str().to_string(),
                model: model.to_string(),
            })?;

            rendered.push_str(&self.0[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }

        rendered.push_str(&self.0[last..]);
        Ok(PathBuf::from(rendered))
    }
}

/// Template variables for a model, leaving out empty values
fn template_vars(model: &ModelRef<'_>) -> BTreeMap<&'static str, String> {
    let node = model.node;
    [
        ("database", node.database.clone()),
        ("schema", node.schema.clone()),
        ("alias", node.alias.clone()),
        ("name", Some(node.name.clone())),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
    .collect()
}

/// Properties entry about to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedProperties {
    /// Model name
    pub model: String,

    /// Target properties file
    pub target: PathBuf,

    /// `{name, columns}` mapping
    pub properties: Mapping,
}

/// How a properties entry was persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesOutcome {
    /// A new properties file was created
    Written,

    /// The entry was appended to an existing file
    Appended,
}

impl PlannedProperties {
    /// Line printed after persisting this entry
    pub fn message(&self, outcome: PropertiesOutcome) -> String {
        let verb = match outcome {
            PropertiesOutcome::Written => "written to",
            PropertiesOutcome::Appended => "appended to",
        };
        format!(
            "{}: the schema of the `{}` model was {} the file.",
            self.target.display(),
            self.model,
            verb
        )
    }

    /// Persist the entry, appending when the target already exists
    pub fn write(&self) -> Result<PropertiesOutcome, PropertiesError> {
        let io_err = |e: std::io::Error| PropertiesError::IoError(self.target.display().to_string(), e.to_string());

        if self.target.exists() {
            let contents = std::fs::read_to_string(&self.target).map_err(io_err)?;
            let mut document: Value = serde_yaml::from_str(&contents).map_err(|e| {
                PropertiesError::InvalidPropertiesFile(self.target.display().to_string(), e.to_string())
            })?;

            if document.is_null() {
                document = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(root) = &mut document else {
                return Err(PropertiesError::InvalidPropertiesFile(
                    self.target.display().to_string(),
                    "top level is not a mapping".to_string(),
                ));
            };

            let entry = Value::Mapping(self.properties.clone());
            match root.get_mut("models") {
                Some(Value::Sequence(models)) => models.push(entry),
                None | Some(Value::Null) => {
                    root.insert(Value::from("models"), Value::Sequence(vec![entry]));
                }
                Some(_) => {
                    return Err(PropertiesError::InvalidPropertiesFile(
                        self.target.display().to_string(),
                        "`models` is not a list".to_string(),
                    ));
                }
            }

            self.save(&document)?;
            Ok(PropertiesOutcome::Appended)
        } else {
            if let Some(parent) = self.target.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }

            let mut root = Mapping::new();
            root.insert(Value::from("version"), Value::from(2));
            root.insert(
                Value::from("models"),
                Value::Sequence(vec![Value::Mapping(self.properties.clone())]),
            );

            self.save(&Value::Mapping(root))?;
            Ok(PropertiesOutcome::Written)
        }
    }

    fn save(&self, document: &Value) -> Result<(), PropertiesError> {
        let yaml = serde_yaml::to_string(document).map_err(|e| {
            PropertiesError::InvalidPropertiesFile(self.target.display().to_string(), e.to_string())
        })?;
        std::fs::write(&self.target, yaml)
            .map_err(|e| PropertiesError::IoError(self.target.display().to_string(), e.to_string()))
    }
}

/// Result of a generation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Lines to print, in order
    pub messages: Vec<String>,

    /// Structured form of everything that happened
    pub diagnostics: Vec<Diagnostic>,

    /// Number of entries persisted
    pub written: usize,

    /// Number of models that could not be handled
    pub failed: usize,
}

impl GenerationReport {
    /// 1 when anything was written or failed, 0 otherwise
    pub fn status(&self) -> i32 {
        if self.written > 0 || self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Generates properties entries for changed models
pub struct PropertiesGenerator<'a> {
    manifest: &'a Manifest,
    catalog: &'a Catalog,
    template: PathTemplate,
}

impl<'a> PropertiesGenerator<'a> {
    /// Create a generator
    pub fn new(manifest: &'a Manifest, catalog: &'a Catalog, template: PathTemplate) -> Self {
        Self {
            manifest,
            catalog,
            template,
        }
    }

    /// Build the entry for a model, or `None` if it is already documented
    ///
    /// Notices (e.g. model missing from the catalog) are appended to `notices`.
    fn model_properties(&self, model: &ModelRef<'_>, notices: &mut Vec<String>) -> Option<Mapping> {
        if model.node.patch_path.as_deref().is_some_and(|p| !p.is_empty()) {
            tracing::debug!("{} already has a properties file", model.unique_id);
            return None;
        }

        let mut properties = Mapping::new();
        properties.insert(Value::from("name"), Value::from(model.node.name.clone()));

        match self.catalog.get_node(model.unique_id) {
            Some(catalog_node) => {
                let columns = catalog_node
                    .column_names()
                    .into_iter()
                    .map(|name| {
                        let mut column = Mapping::new();
                        column.insert(Value::from("name"), Value::from(name));
                        Value::Mapping(column)
                    })
                    .collect();
                properties.insert(Value::from("columns"), Value::Sequence(columns));
            }
            None => notices.push(format!(
                "Unable to find model `{}` in catalog file. Model properties will be created without columns.",
                model.unique_id
            )),
        }

        Some(properties)
    }

    /// Work out what would be written for the changed `paths`
    pub fn plan<P: AsRef<Path>>(&self, paths: &[P]) -> (Vec<PlannedProperties>, GenerationReport) {
        let sqls = filenames_with_extensions(paths, SQL_EXTENSIONS);
        let filenames: BTreeSet<String> = sqls.keys().cloned().collect();
        let models = self.manifest.model_refs(&filenames, false);

        let mut report = GenerationReport::default();
        let mut planned = Vec::new();

        for model in &models {
            let mut notices = Vec::new();
            let Some(properties) = self.model_properties(model, &mut notices) else {
                continue;
            };

            for notice in notices {
                report.diagnostics.push(
                    Diagnostic::new(DiagnosticCode::Info, Severity::Info, notice.clone())
                        .with_model(model.node.name.clone()),
                );
                report.messages.push(notice);
            }

            match self.template.render(&model.node.name, &template_vars(model)) {
                Ok(target) => planned.push(PlannedProperties {
                    model: model.node.name.clone(),
                    target,
                    properties,
                }),
                Err(e) => {
                    report.failed += 1;
                    report.diagnostics.push(
                        Diagnostic::new(DiagnosticCode::PropertiesFileInvalid, Severity::Error, e.to_string())
                            .with_model(model.node.name.clone()),
                    );
                    report.messages.push(e.to_string());
                }
            }
        }

        (planned, report)
    }

    /// Plan and persist properties entries for the changed `paths`
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> GenerationReport {
        let (planned, mut report) = self.plan(paths);

        for entry in planned {
            match entry.write() {
                Ok(outcome) => {
                    let message = entry.message(outcome);
                    tracing::info!("{}", message);
                    report.written += 1;
                    report.diagnostics.push(
                        Diagnostic::new(DiagnosticCode::PropertiesGenerated, Severity::Info, message.clone())
                            .with_location(Location::new(entry.target.display().to_string()))
                            .with_model(entry.model.clone()),
                    );
                    report.messages.push(message);
                }
                Err(e) => {
                    report.failed += 1;
                    report.diagnostics.push(
                        Diagnostic::new(DiagnosticCode::PropertiesFileInvalid, Severity::Error, e.to_string())
                            .with_location(Location::new(entry.target.display().to_string()))
                            .with_model(entry.model.clone()),
                    );
                    report.messages.push(e.to_string());
                }
            }
        }

        report
    }
}

/// Properties generation errors
#[derive(Debug, thiserror::Error)]
pub enum PropertiesError {
    #[error("Input parameter `--properties-file` has to contain `.yml` or `.yaml` extension (got '{0}').")]
    InvalidTemplate(String),

    #[error("Unknown properties file template variable `{{{0}}}`; use one of {{database}}, {{schema}}, {{alias}}, {{name}}.")]
    UnknownTemplateVariable(String),

    #[error("Properties file template variable `{{{variable}}}` has no value for model `{model}`.")]
    MissingTemplateVariable { variable: String, model: String },

    #[error("Failed to write properties file {0}: {1}")]
    IoError(String, String),

    #[error("Properties file {0} is not valid YAML: {1}")]
    InvalidPropertiesFile(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{"nodes": {
        "model.shop.orders": {"name": "orders", "resource_type": "model",
            "original_file_path": "models/orders.sql",
            "database": "analytics", "schema": "marts", "alias": ""},
        "model.shop.customers": {"name": "customers", "resource_type": "model",
            "original_file_path": "models/customers.sql",
            "database": "analytics", "schema": "marts",
            "patch_path": "shop://models/schema.yml"},
        "model.shop.payments": {"name": "payments", "resource_type": "model",
            "original_file_path": "models/payments.sql", "schema": "staging"}
    }}"#;

    const CATALOG: &str = r#"{"nodes": {"model.shop.orders": {"columns": {
        "STATUS": {"name": "STATUS", "index": 2, "type": "TEXT"},
        "ORDER_ID": {"name": "ORDER_ID", "index": 1, "type": "INTEGER"}
    }}}}"#;

    fn fixtures() -> (Manifest, Catalog) {
        (Manifest::from_str(MANIFEST).unwrap(), Catalog::from_str(CATALOG).unwrap())
    }

    #[test]
    fn template_must_be_yaml() {
        assert!(PathTemplate::new("models/{name}.yml").is_ok());
        assert!(PathTemplate::new("models/{name}.yaml").is_ok());
        assert!(matches!(
            PathTemplate::new("models/{name}.YML"),
            Err(PropertiesError::InvalidTemplate(_))
        ));
        assert!(matches!(
            PathTemplate::new("models/{name}.json"),
            Err(PropertiesError::InvalidTemplate(_))
        ));
        assert!(matches!(
            PathTemplate::new("models/{project}/{name}.yml"),
            Err(PropertiesError::UnknownTemplateVariable(ref v)) if v == "project"
        ));
    }

    #[test]
    fn template_rendering() {
        let template = PathTemplate::new("models/{schema}/{name}.yml").unwrap();
        let vars: BTreeMap<&str, String> =
            [("schema", "marts".to_string()), ("name", "orders".to_string())].into();
        assert_eq!(template.render("orders", &vars).unwrap(), PathBuf::from("models/marts/orders.yml"));

        let err = PathTemplate::new("models/{alias}.yml").unwrap().render("orders", &vars).unwrap_err();
        assert!(matches!(err, PropertiesError::MissingTemplateVariable { ref variable, .. } if variable == "alias"));
    }

    #[test]
    fn documented_models_are_not_planned() {
        let (manifest, catalog) = fixtures();
        let generator = PropertiesGenerator::new(&manifest, &catalog, PathTemplate::new("p/{name}.yml").unwrap());

        let (planned, report) = generator.plan(&["models/customers.sql"]);
        assert!(planned.is_empty());
        assert_eq!(report.status(), 0);
    }

    #[test]
    fn columns_come_from_catalog() {
        let (manifest, catalog) = fixtures();
        let generator = PropertiesGenerator::new(&manifest, &catalog, PathTemplate::new("p/{schema}/{name}.yml").unwrap());

        let (planned, report) = generator.plan(&["models/orders.sql", "models/payments.sql"]);
        assert_eq!(planned.len(), 2);

        let orders = planned.iter().find(|p| p.model == "orders").unwrap();
        assert_eq!(orders.target, PathBuf::from("p/marts/orders.yml"));
        let yaml = serde_yaml::to_string(&orders.properties).unwrap();
        assert_eq!(yaml, "name: orders\ncolumns:\n- name: order_id\n- name: status\n");

        let payments = planned.iter().find(|p| p.model == "payments").unwrap();
        assert!(payments.properties.get("columns").is_none());
        assert_eq!(
            report.messages,
            vec!["Unable to find model `model.shop.payments` in catalog file. Model properties will be created without columns."]
        );
    }

    #[test]
    fn missing_template_value_fails_the_model() {
        let (manifest, catalog) = fixtures();
        let generator = PropertiesGenerator::new(&manifest, &catalog, PathTemplate::new("p/{alias}.yml").unwrap());

        let (planned, report) = generator.plan(&["models/orders.sql"]);
        assert!(planned.is_empty());
        assert_eq!(report.failed, 1);
        assert_eq!(report.status(), 1);
    }

    #[test]
    fn writes_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let template = format!("{}/models/{{schema}}/properties.yml", dir.path().display());
        let (manifest, catalog) = fixtures();
        let manifest_orders_schema = Manifest {
            nodes: manifest
                .nodes
                .into_iter()
                .map(|(id, mut node)| {
                    node.schema = Some("marts".to_string());
                    (id, node)
                })
                .collect(),
            ..Manifest::default()
        };
        let generator = PropertiesGenerator::new(
            &manifest_orders_schema,
            &catalog,
            PathTemplate::new(template).unwrap(),
        );

        let report = generator.run(&["models/orders.sql", "models/payments.sql"]);
        assert_eq!(report.written, 2);
        assert_eq!(report.status(), 1);

        let target = dir.path().join("models/marts/properties.yml");
        let written: Value = serde_yaml::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["version"].as_u64(), Some(2));
        let names: Vec<&str> = written["models"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["orders", "payments"]);

        assert!(report.messages.iter().any(|m| m.ends_with("model was written to the file.")));
        assert!(report.messages.iter().any(|m| m.ends_with("model was appended to the file.")));
    }

    #[test]
    fn append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("schema.yml");
        std::fs::write(&target, "version: 2\nsources:\n- name: raw\n").unwrap();

        let mut properties = Mapping::new();
        properties.insert(Value::from("name"), Value::from("orders"));
        let entry = PlannedProperties {
            model: "orders".to_string(),
            target: target.clone(),
            properties,
        };

        assert_eq!(entry.write().unwrap(), PropertiesOutcome::Appended);
        let written: Value = serde_yaml::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["sources"][0]["name"], Value::from("raw"));
        assert_eq!(written["models"][0]["name"], Value::from("orders"));
    }

    #[test]
    fn non_list_models_are_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("schema.yml");
        let original = "version: 2\nmodels:\n  legacy:\n    description: keep me\n";
        std::fs::write(&target, original).unwrap();

        let mut properties = Mapping::new();
        properties.insert(Value::from("name"), Value::from("orders"));
        let entry = PlannedProperties {
            model: "orders".to_string(),
            target: target.clone(),
            properties,
        };

        assert!(matches!(entry.write(), Err(PropertiesError::InvalidPropertiesFile(..))));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), original);
    }

    #[test]
    fn null_models_key_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("schema.yml");
        std::fs::write(&target, "version: 2\nmodels:\n").unwrap();

        let mut properties = Mapping::new();
        properties.insert(Value::from("name"), Value::from("orders"));
        let entry = PlannedProperties {
            model: "orders".to_string(),
            target: target.clone(),
            properties,
        };

        assert_eq!(entry.write().unwrap(), PropertiesOutcome::Appended);
        let written: Value = serde_yaml::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["models"][0]["name"], Value::from("orders"));
    }
}
