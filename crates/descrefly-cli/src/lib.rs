//! descrefly hooks
//!
//! pre-commit entry points. Each hook takes the staged paths, writes its
//! findings to the given writer and returns the process exit status.

pub mod hooks;
pub mod tracking;

pub use hooks::{
    check_model_has_description, generate_model_properties_file, HasDescriptionArgs,
    PropertiesFileArgs, HAS_DESCRIPTION_HOOK, PROPERTIES_FILE_HOOK,
};
pub use tracking::{tracker_from_config, usage_stats_allowed};
