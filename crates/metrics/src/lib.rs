//! Metrics and tracing for the CourseMax core services.

pub mod http;
pub mod metrics;
pub mod tracing;

pub use http::*;
pub use metrics::*;
pub use tracing::*;
