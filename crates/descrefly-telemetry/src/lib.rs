//! Hook usage tracking
//!
//! Every hook run reports a small event (hook name, exit status, error
//! messages and anonymised project context). Delivery is best-effort:
//! [`emit`] bounds the attempt with a timeout and swallows every failure,
//! so tracking can never change a hook's exit status.
//!
//! ## Example
//!
//! ```rust,ignore
//! use descrefly_telemetry::{emit, HookEvent, HttpTracker};
//!
//! let tracker = HttpTracker::new("http://localhost:9000/events", timeout)?;
//! let event = HookEvent::new("check-model-has-description", properties, &manifest.metadata);
//! emit(&tracker, &event, timeout).await;
//! ```

pub mod event;
pub mod tracker;
pub mod http;
pub mod mock;

pub use event::{HookEvent, HookProperties, ManifestContext};
pub use tracker::{emit, HookTracker, NoopTracker, TelemetryError};
pub use http::HttpTracker;
pub use mock::MockTracker;
