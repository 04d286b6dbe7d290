//! Observability Store
//!
//! Write path for suggestion events, applications, and graph snapshots;
//! read path for the dashboard and analysis queries.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::graph::GraphHealthReport;
use crate::storage::{
    SnapshotMetricRow, StateStore, StoreResult, SuggestionEventRow, SuppressionRow, TopEntityRow,
};

use super::queries::{
    Granularity, HubScoreChange, LayerBucket, LayerStatus, MetricChange, SnapshotComparison,
    TimelineEvent,
};

/// Default retention window for observability rows
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Dashboard aggregation window
const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// Contributions below this are "dormant"
const DORMANT_EPSILON: f64 = 1e-3;

/// Metric name under which the hub-score top list is stored
const HUB_SCORES_METRIC: &str = "hub_scores_top10";

/// Aggregate totals for the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub suggestions: u64,
    pub passed: u64,
    pub applications: u64,
    pub feedback_positive: u64,
    pub feedback_negative: u64,
}

/// Extended dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub window_days: i64,
    pub totals: DashboardTotals,
    pub acceptance_rate: f64,
    pub top_entities: Vec<TopEntityRow>,
    pub suppressions: Vec<SuppressionRow>,
    pub layer_status: BTreeMap<String, LayerStatus>,
    /// Sampling applied to sub-threshold events (1.0 = persist all)
    pub sub_threshold_sampling_rate: f64,
}

/// Observability store over the shared state store
pub struct ObservabilityStore {
    store: Arc<StateStore>,
    /// Sampling rate for sub-threshold events; passing events always persist
    sampling_rate: f64,
    retention_days: i64,
}

impl ObservabilityStore {
    pub fn new(store: Arc<StateStore>, sampling_rate: f64, retention_days: i64) -> Self {
        Self {
            store,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            retention_days: retention_days.max(1),
        }
    }

    /// Persist one suggestion call's scored candidates
    ///
    /// Passing candidates always persist. Sub-threshold candidates persist
    /// subject to the sampling rate, decided by a deterministic hash so a
    /// repeated call makes the same decision.
    pub fn record_suggestions(&self, events: &[SuggestionEventRow]) -> StoreResult<usize> {
        let kept: Vec<SuggestionEventRow> = events
            .iter()
            .filter(|e| e.passed || self.keep_sub_threshold(&e.note_path, &e.entity))
            .cloned()
            .collect();
        self.store.insert_suggestion_events(&kept)?;
        Ok(kept.len())
    }

    fn keep_sub_threshold(&self, note_path: &str, entity: &str) -> bool {
        if self.sampling_rate >= 1.0 {
            return true;
        }
        if self.sampling_rate <= 0.0 {
            return false;
        }
        let mut hasher = std::hash::DefaultHasher::new();
        note_path.hash(&mut hasher);
        entity.hash(&mut hasher);
        ((hasher.finish() % 10_000) as f64) < self.sampling_rate * 10_000.0
    }

    /// Record an applied suggestion and touch the entity's recency
    pub fn record_application(&self, entity: &str, note_path: &str) -> StoreResult<()> {
        let now = Utc::now();
        self.store.insert_application(entity, note_path, now)?;
        self.store.touch_recency(entity, now)?;
        Ok(())
    }

    /// Write one graph snapshot batch
    pub fn record_graph_snapshot(
        &self,
        report: &GraphHealthReport,
        hub_top: &[(String, u32)],
    ) -> StoreResult<DateTime<Utc>> {
        let now = Utc::now();
        let mut rows: Vec<SnapshotMetricRow> = [
            ("note_count", report.note_count as f64),
            ("link_count", report.link_count as f64),
            ("link_density", report.link_density),
            ("orphan_count", report.orphan_count as f64),
            ("orphan_rate", report.orphan_rate),
            ("entity_coverage", report.entity_coverage),
            ("connectedness", report.connectedness),
            ("cluster_count", report.cluster_count as f64),
            ("largest_cluster_size", report.largest_cluster_size as f64),
            ("gini_coefficient", report.gini_coefficient),
            ("clustering_coefficient", report.clustering_coefficient),
            ("avg_path_length", report.avg_path_length),
            (
                "degree_centrality_std_dev",
                report.degree_centrality_std_dev,
            ),
            (
                "betweenness_top5pct_share",
                report.betweenness_top5_pct_share,
            ),
            ("avg_degree", report.avg_degree),
            ("max_degree", report.max_degree as f64),
        ]
        .into_iter()
        .map(|(metric, value)| SnapshotMetricRow {
            metric: metric.to_string(),
            value,
            details_json: None,
        })
        .collect();

        rows.push(SnapshotMetricRow {
            metric: HUB_SCORES_METRIC.to_string(),
            value: hub_top.len() as f64,
            details_json: Some(serde_json::to_string(hub_top)?),
        });

        self.store.insert_graph_snapshot(now, &rows)?;
        tracing::info!(metrics = rows.len(), "graph snapshot recorded");
        Ok(now)
    }

    /// Chronological score history for one entity
    pub fn entity_score_timeline(
        &self,
        entity: &str,
        days: i64,
        limit: usize,
    ) -> StoreResult<Vec<TimelineEvent>> {
        let since = Utc::now() - Duration::days(days.max(0));
        let rows = self
            .store
            .suggestion_events_for_entity(entity, since, limit)?;
        Ok(rows
            .into_iter()
            .map(|row| TimelineEvent {
                timestamp: row.timestamp,
                note_path: row.note_path,
                total_score: row.total_score,
                threshold: row.threshold,
                passed: row.passed,
                strictness: row.strictness,
                breakdown: row.breakdown,
            })
            .collect())
    }

    /// Per-bucket average of each breakdown field
    ///
    /// Values are averages over the bucket's event count, never raw sums.
    pub fn layer_contribution_timeseries(
        &self,
        granularity: Granularity,
        days: i64,
    ) -> StoreResult<Vec<LayerBucket>> {
        let since = Utc::now() - Duration::days(days.max(0));
        let rows = self.store.suggestion_events_since(since)?;

        let mut buckets: BTreeMap<String, (u64, BTreeMap<&'static str, f64>)> = BTreeMap::new();
        for row in &rows {
            let key = granularity.bucket_key(row.timestamp);
            let (count, sums) = buckets.entry(key).or_default();
            *count += 1;
            for (field, value) in row.breakdown.fields() {
                if let Some(value) = value {
                    *sums.entry(field).or_default() += value;
                }
            }
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket, (events, sums))| LayerBucket {
                bucket,
                events,
                averages: sums
                    .into_iter()
                    .map(|(field, sum)| (field.to_string(), sum / events as f64))
                    .collect(),
            })
            .collect())
    }

    /// Compare the snapshot batches nearest to two instants
    pub fn compare_graph_snapshots(
        &self,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
    ) -> StoreResult<Option<SnapshotComparison>> {
        let Some(from_time) = self.store.nearest_snapshot_time(t1)? else {
            return Ok(None);
        };
        let Some(to_time) = self.store.nearest_snapshot_time(t2)? else {
            return Ok(None);
        };

        let from_rows = self.store.snapshot_rows_at(from_time)?;
        let to_rows = self.store.snapshot_rows_at(to_time)?;

        let from_map: BTreeMap<&str, &SnapshotMetricRow> =
            from_rows.iter().map(|r| (r.metric.as_str(), r)).collect();
        let mut metric_changes = Vec::new();
        for to_row in &to_rows {
            if to_row.metric == HUB_SCORES_METRIC {
                continue;
            }
            if let Some(from_row) = from_map.get(to_row.metric.as_str()) {
                metric_changes.push(MetricChange {
                    metric: to_row.metric.clone(),
                    from: from_row.value,
                    to: to_row.value,
                    delta: to_row.value - from_row.value,
                });
            }
        }

        let hub_from = hub_details(&from_rows);
        let hub_to = hub_details(&to_rows);
        let mut hub_score_changes: Vec<HubScoreChange> = hub_from
            .keys()
            .chain(hub_to.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .filter_map(|entity| {
                let from = hub_from.get(entity).copied().unwrap_or(0);
                let to = hub_to.get(entity).copied().unwrap_or(0);
                (from != to).then(|| HubScoreChange {
                    entity: entity.clone(),
                    from,
                    to,
                })
            })
            .collect();
        hub_score_changes.sort_by_key(|c| std::cmp::Reverse(c.to.abs_diff(c.from)));

        Ok(Some(SnapshotComparison {
            from: from_time,
            to: to_time,
            metric_changes,
            hub_score_changes,
        }))
    }

    /// Aggregates over feedback, suppression, top entities, and layer status
    pub fn extended_dashboard_data(&self) -> StoreResult<DashboardData> {
        let since = Utc::now() - Duration::days(DASHBOARD_WINDOW_DAYS);
        let (suggestions, passed) = self.store.suggestion_counts_since(since)?;
        let (feedback_positive, feedback_negative) = self.store.feedback_totals()?;
        let applications = self.store.application_count()?;

        let acceptance_rate = if suggestions == 0 {
            0.0
        } else {
            passed as f64 / suggestions as f64
        };

        Ok(DashboardData {
            window_days: DASHBOARD_WINDOW_DAYS,
            totals: DashboardTotals {
                suggestions,
                passed,
                applications,
                feedback_positive,
                feedback_negative,
            },
            acceptance_rate,
            top_entities: self.store.top_entities_since(since, 10)?,
            suppressions: self.store.suppression_rows()?,
            layer_status: self.layer_status(since)?,
            sub_threshold_sampling_rate: self.sampling_rate,
        })
    }

    fn layer_status(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<BTreeMap<String, LayerStatus>> {
        let rows = self.store.suggestion_events_since(since)?;

        let mut present: BTreeMap<&'static str, (u64, f64)> = BTreeMap::new();
        let mut all_fields: Vec<&'static str> = Vec::new();
        for (field, _) in crate::scoring::ScoreBreakdown::default().fields() {
            all_fields.push(field);
        }
        for row in &rows {
            for (field, value) in row.breakdown.fields() {
                if let Some(value) = value {
                    let entry = present.entry(field).or_default();
                    entry.0 += 1;
                    entry.1 += value.abs();
                }
            }
        }

        Ok(all_fields
            .into_iter()
            .map(|field| {
                let status = match present.get(field) {
                    None => LayerStatus::ZeroData,
                    Some((count, magnitude)) => {
                        if magnitude / *count as f64 > DORMANT_EPSILON {
                            LayerStatus::Contributing
                        } else {
                            LayerStatus::Dormant
                        }
                    }
                };
                (field.to_string(), status)
            })
            .collect())
    }

    /// Purge rows past the retention window; idempotent
    pub fn purge_expired(&self) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::days(self.retention_days);
        let purged = self.store.purge_before(cutoff)?;
        if purged > 0 {
            tracing::info!(purged, retention_days = self.retention_days, "retention purge");
        }
        Ok(purged)
    }
}

fn hub_details(rows: &[SnapshotMetricRow]) -> BTreeMap<String, u32> {
    rows.iter()
        .find(|r| r.metric == HUB_SCORES_METRIC)
        .and_then(|r| r.details_json.as_deref())
        .and_then(|json| serde_json::from_str::<Vec<(String, u32)>>(json).ok())
        .unwrap_or_default()
        .into_iter()
        .collect()
}
