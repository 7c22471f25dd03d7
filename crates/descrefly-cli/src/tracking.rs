//! Tracker selection

use std::time::Duration;

use descrefly_core::TelemetryConfig;
use descrefly_dbt::ManifestMetadata;
use descrefly_telemetry::{HookTracker, HttpTracker, NoopTracker};

/// Build the tracker described by `config`
///
/// `env_value` is the value of `DESCREFLY_DISABLE_TRACKING`, if set. Any
/// problem building the HTTP client falls back to the no-op tracker.
pub fn tracker_from_config(config: &TelemetryConfig, env_value: Option<&str>) -> Box<dyn HookTracker> {
    let Some(endpoint) = config.active_endpoint(env_value) else {
        tracing::debug!("hook tracking disabled");
        return Box::new(NoopTracker);
    };

    match HttpTracker::new(endpoint, Duration::from_millis(config.timeout_ms)) {
        Ok(tracker) => Box::new(tracker),
        Err(e) => {
            tracing::warn!("hook tracking disabled: {}", e);
            Box::new(NoopTracker)
        }
    }
}

/// dbt projects can opt out of usage stats in their profile; honour it
pub fn usage_stats_allowed(metadata: &ManifestMetadata) -> bool {
    metadata.send_anonymous_usage_stats != Some(false)
}
