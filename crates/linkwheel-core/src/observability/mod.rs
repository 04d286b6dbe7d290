//! Observability Module
//!
//! Persists every scored candidate (pass or fail), applications, and
//! periodic graph snapshots; serves the timeline, timeseries, comparison,
//! and dashboard queries downstream tooling consumes.

mod queries;
mod store;

pub use queries::{
    Granularity, HubScoreChange, LayerBucket, LayerStatus, MetricChange, SnapshotComparison,
    TimelineEvent,
};
pub use store::{DashboardData, DashboardTotals, ObservabilityStore, DEFAULT_RETENTION_DAYS};
