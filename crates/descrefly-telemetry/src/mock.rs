//! Mock tracker for testing
//!
//! Records events in memory instead of sending them anywhere. It can also
//! simulate an unreachable collector or a slow network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let tracker = MockTracker::new();
//! emit(&tracker, &event, Duration::from_secs(1)).await;
//! assert_eq!(tracker.events().await.len(), 1);
//!
//! // Simulate network failure
//! let tracker = MockTracker::new().with_failure();
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::event::HookEvent;
use crate::tracker::{HookTracker, TelemetryError};

/// In-memory tracker
#[derive(Debug, Clone, Default)]
pub struct MockTracker {
    /// Events delivered so far
    events: Arc<RwLock<Vec<HookEvent>>>,

    /// Simulate an unreachable collector
    fail: bool,

    /// Simulate delivery latency (milliseconds)
    latency_ms: u64,
}

impl MockTracker {
    /// Create a tracker that accepts every event
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every delivery with a network error
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Delay every delivery
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    /// Events delivered so far
    pub async fn events(&self) -> Vec<HookEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait::async_trait]
impl HookTracker for MockTracker {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn track(&self, event: &HookEvent) -> Result<(), TelemetryError> {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail {
            return Err(TelemetryError::NetworkError("collector unreachable (simulated)".to_string()));
        }

        self.events.write().await.push(event.clone());
        Ok(())
    }
}
