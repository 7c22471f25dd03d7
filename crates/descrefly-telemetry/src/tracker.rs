//! Tracker trait and best-effort emission

use std::time::Duration;

use crate::event::HookEvent;

/// Errors that can occur when delivering an event
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Collector rejected event: HTTP {0}")]
    Rejected(u16),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Destination for hook events
#[async_trait::async_trait]
pub trait HookTracker: Send + Sync {
    /// Get the tracker name (e.g., "http", "noop")
    fn name(&self) -> &'static str;

    /// Deliver one event
    async fn track(&self, event: &HookEvent) -> Result<(), TelemetryError>;
}

/// Tracker used when tracking is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

#[async_trait::async_trait]
impl HookTracker for NoopTracker {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn track(&self, _event: &HookEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Send `event` through `tracker`, giving up after `timeout`
///
/// Never fails: errors are logged at debug level and dropped. Returns
/// whether the event was delivered.
pub async fn emit(tracker: &dyn HookTracker, event: &HookEvent, timeout: Duration) -> bool {
    let outcome = match tokio::time::timeout(timeout, tracker.track(event)).await {
        Ok(result) => result,
        Err(_) => Err(TelemetryError::Timeout(timeout)),
    };

    match outcome {
        Ok(()) => {
            tracing::debug!(tracker = tracker.name(), hook = %event.hook_name, "hook event sent");
            true
        }
        Err(e) => {
            tracing::debug!(tracker = tracker.name(), hook = %event.hook_name, "hook event dropped: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HookProperties;
    use crate::mock::MockTracker;
    use descrefly_dbt::ManifestMetadata;

    fn event() -> HookEvent {
        HookEvent::new(
            "check-model-has-description",
            HookProperties {
                status: 0,
                description: "test".to_string(),
                error_messages: Vec::new(),
            },
            &ManifestMetadata::default(),
        )
    }

    #[tokio::test]
    async fn noop_always_succeeds() {
        assert!(emit(&NoopTracker, &event(), Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let tracker = MockTracker::new().with_failure();
        assert!(!emit(&tracker, &event(), Duration::from_secs(1)).await);
        assert!(tracker.events().await.is_empty());
    }

    #[tokio::test]
    async fn slow_trackers_are_cut_off() {
        let tracker = MockTracker::new().with_latency(500);
        let delivered = emit(&tracker, &event(), Duration::from_millis(20)).await;
        assert!(!delivered);
    }
}
