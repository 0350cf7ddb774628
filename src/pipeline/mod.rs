// src/pipeline/mod.rs

pub mod metrics;
pub mod tick;

pub use metrics::{DriveMetrics, MetricsSummary};
pub use tick::{DrivingCore, TickOutput};
