//! HTTP tracker
//!
//! POSTs each event as JSON to a configured collector.

use reqwest::Client;
use std::time::Duration;

use crate::event::HookEvent;
use crate::tracker::{HookTracker, TelemetryError};

/// Tracker that sends events to an HTTP collector
pub struct HttpTracker {
    client: Client,
    endpoint: String,
}

impl HttpTracker {
    /// Create a tracker for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TelemetryError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(TelemetryError::ConfigError(format!(
                "telemetry endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl HookTracker for HttpTracker {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn track(&self, event: &HookEvent) -> Result<(), TelemetryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| TelemetryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
