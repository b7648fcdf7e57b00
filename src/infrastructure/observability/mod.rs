//! Process metrics

mod metrics;

pub use metrics::{AppMetrics, MetricsSnapshot};
