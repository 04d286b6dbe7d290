//! Score Breakdown
//!
//! One numeric field per layer. The total is the sum of present fields,
//! clamped to ≥ 0; NaN and infinities are sanitized at the layer boundary
//! so a breakdown is always finite.

use serde::{Deserialize, Serialize};

/// Per-layer decomposition of a candidate's score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub content_match: f64,
    pub cooccurrence_boost: f64,
    pub type_boost: f64,
    pub context_boost: f64,
    pub recency_boost: f64,
    pub cross_folder_boost: f64,
    pub hub_boost: f64,
    pub feedback_adjustment: f64,
    pub suppression_penalty: f64,
    /// Present only when an embedding provider is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_boost: Option<f64>,
    /// Present only when a note-affinity graph is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_weight_boost: Option<f64>,
}

impl ScoreBreakdown {
    /// Sum of present fields, clamped to ≥ 0
    pub fn total(&self) -> f64 {
        let sum = self.content_match
            + self.cooccurrence_boost
            + self.type_boost
            + self.context_boost
            + self.recency_boost
            + self.cross_folder_boost
            + self.hub_boost
            + self.feedback_adjustment
            + self.suppression_penalty
            + self.semantic_boost.unwrap_or(0.0)
            + self.edge_weight_boost.unwrap_or(0.0);
        sanitize(sum).max(0.0)
    }

    /// Field values keyed by wire name, for the layer timeseries
    pub fn fields(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("contentMatch", Some(self.content_match)),
            ("cooccurrenceBoost", Some(self.cooccurrence_boost)),
            ("typeBoost", Some(self.type_boost)),
            ("contextBoost", Some(self.context_boost)),
            ("recencyBoost", Some(self.recency_boost)),
            ("crossFolderBoost", Some(self.cross_folder_boost)),
            ("hubBoost", Some(self.hub_boost)),
            ("feedbackAdjustment", Some(self.feedback_adjustment)),
            ("suppressionPenalty", Some(self.suppression_penalty)),
            ("semanticBoost", self.semantic_boost),
            ("edgeWeightBoost", self.edge_weight_boost),
        ]
    }
}

/// NaN and infinity collapse to 0; layers call this on every contribution
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
