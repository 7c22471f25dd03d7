//! Changed-path handling
//!
//! pre-commit hands over the staged paths as positional arguments. Hooks
//! key everything on the file name without extension, which is how dbt
//! names a model after its SQL file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::manifest::Manifest;

/// Extensions recognised as YAML schema files
pub const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Extension recognised as a model SQL file
pub const SQL_EXTENSIONS: &[&str] = &["sql"];

/// File name without its extension
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Whether `path` ends in one of `extensions` (case-sensitive, like dbt)
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Map of file stem to path for every path with one of `extensions`
///
/// When two paths share a stem the later one wins.
pub fn filenames_with_extensions<P: AsRef<Path>>(
    paths: &[P],
    extensions: &[&str],
) -> BTreeMap<String, PathBuf> {
    paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| has_extension(path, extensions))
        .filter_map(|path| file_stem(path).map(|stem| (stem, path.to_path_buf())))
        .collect()
}

/// Changed paths split into model SQL files and YAML schema files
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangedFiles {
    /// Model file name -> SQL path, only for files known to the manifest
    pub sqls: BTreeMap<String, PathBuf>,

    /// YAML schema files, in the order they were passed
    pub ymls: Vec<PathBuf>,
}

impl ChangedFiles {
    /// Partition `paths` against the (non-ephemeral) models in `manifest`
    pub fn partition<P: AsRef<Path>>(paths: &[P], manifest: &Manifest) -> Self {
        let known = manifest.model_filenames();

        let sqls = filenames_with_extensions(paths, SQL_EXTENSIONS)
            .into_iter()
            .filter(|(stem, path)| {
                let found = known.contains(stem);
                if !found {
                    tracing::debug!("{} is not a model in the manifest, skipping", path.display());
                }
                found
            })
            .collect();

        let ymls = paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| has_extension(path, YAML_EXTENSIONS))
            .map(Path::to_path_buf)
            .collect();

        Self { sqls, ymls }
    }

    /// Model file names under consideration
    pub fn filenames(&self) -> BTreeSet<String> {
        self.sqls.keys().cloned().collect()
    }

    /// Whether there is no model SQL file to check
    pub fn is_empty(&self) -> bool {
        self.sqls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manifest() -> Manifest {
        Manifest::from_str(
            r#"{"nodes": {
                "model.p.orders": {"name": "orders", "resource_type": "model",
                                   "original_file_path": "models/orders.sql"},
                "model.p.eph": {"name": "eph", "resource_type": "model",
                                "original_file_path": "models/eph.sql",
                                "config": {"materialized": "ephemeral"}}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn stems_by_extension() {
        let paths = ["models/a.sql", "models/b.yml", "models/c.yaml", "README.md", "models/D.SQL"];
        let sqls = filenames_with_extensions(&paths, SQL_EXTENSIONS);
        assert_eq!(sqls.keys().cloned().collect::<Vec<_>>(), vec!["a"]);

        let ymls = filenames_with_extensions(&paths, YAML_EXTENSIONS);
        assert_eq!(ymls.get("c"), Some(&PathBuf::from("models/c.yaml")));
    }

    #[test]
    fn partition_keeps_only_manifest_models() {
        let paths = [
            "models/orders.sql",
            "models/eph.sql",
            "macros/cents_to_dollars.sql",
            "models/schema.yml",
        ];
        let changed = ChangedFiles::partition(&paths, &manifest());

        assert_eq!(changed.filenames().into_iter().collect::<Vec<_>>(), vec!["orders"]);
        assert_eq!(changed.ymls, vec![PathBuf::from("models/schema.yml")]);
    }

    #[test]
    fn empty_input() {
        let paths: [&str; 0] = [];
        let changed = ChangedFiles::partition(&paths, &manifest());
        assert!(changed.is_empty());
        assert!(changed.ymls.is_empty());
    }

    #[test]
    fn extensions_are_case_sensitive() {
        assert!(has_extension(Path::new("models/schema.yml"), YAML_EXTENSIONS));
        assert!(!has_extension(Path::new("models/schema.YML"), YAML_EXTENSIONS));
        assert!(!has_extension(Path::new("models/orders.Sql"), SQL_EXTENSIONS));
    }

    #[test]
    fn file_stem_ignores_directories() {
        assert_eq!(file_stem(Path::new("models/marts/orders.sql")), Some("orders".to_string()));
        assert_eq!(file_stem(Path::new("")), None);
    }
}
