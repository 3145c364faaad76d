//! Observability: structured logging, metrics and health reporting

pub mod health;
pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use health::{HealthReport, HealthState};
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};

// Span macros for structured logging
pub use logging::{agent_span, task_span};
