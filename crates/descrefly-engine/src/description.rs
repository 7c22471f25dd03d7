//! Description coverage
//!
//! A changed model is covered when its manifest node carries a description
//! or a changed schema file declares one for it. Everything else is
//! reported, one diagnostic per SQL file, in file-name order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use descrefly_core::{AllowlistRules, Diagnostic, DiagnosticCode, Location, Severity};
use descrefly_dbt::{ChangedFiles, Manifest, ModelRef, ModelSchema, model_schemas};

/// A changed model without any description
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingDescription {
    /// Model file name (no extension)
    pub filename: String,

    /// SQL path as passed on the command line
    pub path: PathBuf,
}

impl MissingDescription {
    /// Line printed for this finding
    pub fn message(&self) -> String {
        format!(
            "{}: does not have defined description or properties file is missing.",
            self.path.display()
        )
    }

    /// Structured form of the finding
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::ModelDescriptionMissing, Severity::Error, self.message())
            .with_location(Location::new(self.path.display().to_string()))
            .with_model(self.filename.clone())
    }
}

/// Candidates minus the models described inline minus the models described
/// in schema files
pub fn compute_missing(
    candidates: &BTreeMap<String, PathBuf>,
    models: &[ModelRef<'_>],
    schemas: &[ModelSchema],
) -> Vec<MissingDescription> {
    let in_models: BTreeSet<&str> = models
        .iter()
        .filter(|model| model.node.has_description())
        .map(|model| model.filename.as_str())
        .collect();

    let in_schemas: BTreeSet<&str> = schemas
        .iter()
        .filter(|schema| schema.entry.has_description())
        .map(|schema| schema.model_name.as_str())
        .collect();

    candidates
        .iter()
        .filter(|(filename, _)| {
            !in_models.contains(filename.as_str()) && !in_schemas.contains(filename.as_str())
        })
        .map(|(filename, path)| MissingDescription {
            filename: filename.clone(),
            path: path.clone(),
        })
        .collect()
}

/// Result of a description check run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionCoverage {
    /// Model file name -> SQL path for every model that was checked
    pub checked: BTreeMap<String, PathBuf>,

    /// Findings, sorted by file name
    pub missing: Vec<MissingDescription>,

    /// Schema files that could not be read
    pub warnings: Vec<Diagnostic>,
}

impl DescriptionCoverage {
    /// 0 when every checked model is documented, 1 otherwise
    pub fn status(&self) -> i32 {
        if self.missing.is_empty() {
            0
        } else {
            1
        }
    }

    /// One line per finding
    pub fn messages(&self) -> Vec<String> {
        self.missing.iter().map(MissingDescription::message).collect()
    }

    /// Number of checked models that have a description
    pub fn documented(&self) -> usize {
        self.checked.len() - self.missing.len()
    }

    /// Findings and warnings as diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.missing
            .iter()
            .map(MissingDescription::to_diagnostic)
            .chain(self.warnings.iter().cloned())
            .collect()
    }
}

/// Description check over a loaded manifest
pub struct DescriptionCheck<'a> {
    manifest: &'a Manifest,
    allowlist: AllowlistRules,
}

impl<'a> DescriptionCheck<'a> {
    /// Create a check against `manifest`
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            allowlist: AllowlistRules::default(),
        }
    }

    /// Skip models matched by the allowlist
    pub fn with_allowlist(mut self, allowlist: AllowlistRules) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Check the changed `paths`
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> DescriptionCoverage {
        let mut changed = ChangedFiles::partition(paths, self.manifest);

        changed.sqls.retain(|filename, _| {
            let skipped = self.allowlist.is_model_skipped(filename);
            if skipped {
                tracing::debug!("{} is allowlisted, skipping", filename);
            }
            !skipped
        });

        if changed.is_empty() {
            tracing::debug!("no changed model files to check");
            return DescriptionCoverage::default();
        }

        let filenames = changed.filenames();
        let models = self.manifest.model_refs(&filenames, false);
        let (schemas, errors) = model_schemas(&changed.ymls, &filenames);

        let warnings = errors
            .iter()
            .map(|e| {
                tracing::warn!("{}", e);
                Diagnostic::new(DiagnosticCode::SchemaFileUnreadable, Severity::Warn, e.to_string())
                    .with_location(Location::new(e.path()))
            })
            .collect();

        let missing = compute_missing(&changed.sqls, &models, &schemas);
        tracing::debug!(
            checked = changed.sqls.len(),
            missing = missing.len(),
            "description coverage computed"
        );

        DescriptionCoverage {
            checked: changed.sqls,
            missing,
            warnings,
        }
    }
}
