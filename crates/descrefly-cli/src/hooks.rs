//! Hook runners

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use descrefly_core::{Config, Diagnostic, DiagnosticCode, Location, Report, Severity};
use descrefly_dbt::{Catalog, Manifest};
use descrefly_engine::{DescriptionCheck, PathTemplate, PropertiesGenerator};
use descrefly_telemetry::{emit, HookEvent, HookProperties, HookTracker};

use crate::tracking::usage_stats_allowed;

/// Hook id of the description check
pub const HAS_DESCRIPTION_HOOK: &str = "check-model-has-description";

/// Hook id of the properties file generator
pub const PROPERTIES_FILE_HOOK: &str = "generate-model-properties-file";

const HAS_DESCRIPTION_SUMMARY: &str = "Check the model has description.";

/// Arguments of `check-model-has-description`
#[derive(Debug, Clone, Args)]
pub struct HasDescriptionArgs {
    /// Changed files (passed by pre-commit)
    pub filenames: Vec<PathBuf>,

    /// Path to dbt manifest.json
    #[arg(long, default_value = "target/manifest.json")]
    pub manifest: PathBuf,

    /// Also write a JSON report to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `generate-model-properties-file`
#[derive(Debug, Clone, Args)]
pub struct PropertiesFileArgs {
    /// Changed files (passed by pre-commit)
    pub filenames: Vec<PathBuf>,

    /// Path to dbt manifest.json
    #[arg(long, default_value = "target/manifest.json")]
    pub manifest: PathBuf,

    /// Path to dbt catalog.json
    #[arg(long, default_value = "target/catalog.json")]
    pub catalog: PathBuf,

    /// Where new model properties are written. Must end in `.yml` or `.yaml`
    /// and may use {database}, {schema}, {alias} and {name}, e.g.
    /// `models/{schema}/{name}.yml`.
    #[arg(long)]
    pub properties_file: String,
}

/// Report every changed model that has no description
///
/// Returns 1 when a model lacks a description or the manifest cannot be
/// loaded, 0 otherwise. Tracking failures never affect the result.
pub async fn check_model_has_description<W: Write>(
    args: &HasDescriptionArgs,
    config: &Config,
    tracker: &dyn HookTracker,
    out: &mut W,
) -> Result<i32> {
    let manifest = match Manifest::from_file(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            let message = format!("Unable to load manifest file ({})", e);
            writeln!(out, "{}", message)?;
            if let Some(output) = &args.output {
                let diagnostic = Diagnostic::new(DiagnosticCode::ManifestLoadFailed, Severity::Error, message)
                    .with_location(Location::new(args.manifest.display().to_string()));
                save_report(Report::from_diagnostics(HAS_DESCRIPTION_HOOK, vec![diagnostic]), output)?;
            }
            return Ok(1);
        }
    };

    let coverage = DescriptionCheck::new(&manifest)
        .with_allowlist(config.allowlist.clone())
        .run(&args.filenames);

    let messages = coverage.messages();
    for message in &messages {
        writeln!(out, "{}", message)?;
    }

    let status = coverage.status();

    if usage_stats_allowed(&manifest.metadata) {
        let event = HookEvent::new(
            HAS_DESCRIPTION_HOOK,
            HookProperties {
                status,
                description: HAS_DESCRIPTION_SUMMARY.to_string(),
                error_messages: messages,
            },
            &manifest.metadata,
        );
        emit(tracker, &event, Duration::from_millis(config.telemetry.timeout_ms)).await;
    }

    if let Some(output) = &args.output {
        let report = Report::from_diagnostics(HAS_DESCRIPTION_HOOK, coverage.diagnostics())
            .with_coverage(coverage.checked.len(), coverage.documented());
        save_report(report, output)?;
    }

    Ok(status)
}

fn save_report(report: Report, output: &Path) -> Result<()> {
    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;
    tracing::debug!("report saved to {}", output.display());
    Ok(())
}

/// Write skeleton properties for changed models that have none
///
/// Returns 1 when anything was written (the files must be staged) or could
/// not be written, 0 otherwise.
pub fn generate_model_properties_file<W: Write>(args: &PropertiesFileArgs, out: &mut W) -> Result<i32> {
    let template = match PathTemplate::new(args.properties_file.as_str()) {
        Ok(template) => template,
        Err(e) => {
            writeln!(out, "{}", e)?;
            return Ok(1);
        }
    };

    let manifest = match Manifest::from_file(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            writeln!(out, "Unable to load manifest file ({})", e)?;
            return Ok(1);
        }
    };

    let catalog = match Catalog::from_file(&args.catalog) {
        Ok(catalog) => catalog,
        Err(e) => {
            writeln!(out, "Unable to load catalog file ({})", e)?;
            return Ok(1);
        }
    };

    let report = PropertiesGenerator::new(&manifest, &catalog, template).run(&args.filenames);
    for message in &report.messages {
        writeln!(out, "{}", message)?;
    }

    Ok(report.status())
}
