//! Observability Query Types
//!
//! Wire-shaped result types for the timeline, timeseries, snapshot
//! comparison, and per-layer status queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::profiles::Strictness;
use crate::scoring::ScoreBreakdown;

/// Bucketing granularity for the layer timeseries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
}

impl Granularity {
    /// Bucket key for a timestamp: UTC date for days, ISO week for weeks
    pub fn bucket_key(&self, at: DateTime<Utc>) -> String {
        match self {
            Granularity::Day => at.format("%Y-%m-%d").to_string(),
            Granularity::Week => {
                let week = at.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
        }
    }
}

/// One event on an entity's score timeline
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    pub note_path: String,
    pub total_score: f64,
    pub threshold: f64,
    pub passed: bool,
    pub strictness: Strictness,
    pub breakdown: ScoreBreakdown,
}

/// Per-bucket layer averages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerBucket {
    /// "2026-07-14" or "2026-W29"
    pub bucket: String,
    pub events: u64,
    /// Average contribution per breakdown field; absent fields are omitted
    pub averages: BTreeMap<String, f64>,
}

/// Change in one topology metric between two snapshots
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricChange {
    pub metric: String,
    pub from: f64,
    pub to: f64,
    pub delta: f64,
}

/// Change in one entity's hub score between two snapshots
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubScoreChange {
    pub entity: String,
    pub from: u32,
    pub to: u32,
}

/// Result of comparing two snapshot batches
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotComparison {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub metric_changes: Vec<MetricChange>,
    pub hub_score_changes: Vec<HubScoreChange>,
}

/// Whether a layer is pulling its weight in the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerStatus {
    /// Produces non-trivial contributions
    Contributing,
    /// Present in events but contributing ~0
    Dormant,
    /// No event carries the field at all
    ZeroData,
}
