//! Strictness Profiles
//!
//! Three named modes supplying thresholds, per-layer weights, and result
//! caps. Conservative trades recall for precision; aggressive the reverse.

use serde::{Deserialize, Serialize};

use crate::scoring::Layer;

/// Strictness mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Conservative => "conservative",
            Strictness::Balanced => "balanced",
            Strictness::Aggressive => "aggressive",
        }
    }

    /// Parse the persisted column form
    pub fn parse_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "conservative" => Some(Strictness::Conservative),
            "balanced" => Some(Strictness::Balanced),
            "aggressive" => Some(Strictness::Aggressive),
            _ => None,
        }
    }

    pub const ALL: [Strictness; 3] = [
        Strictness::Conservative,
        Strictness::Balanced,
        Strictness::Aggressive,
    ];
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Threshold and weight bundle for one mode
#[derive(Debug, Clone, PartialEq)]
pub struct StrictnessProfile {
    pub strictness: Strictness,
    /// Minimum total score to pass
    pub min_score: f64,
    /// Hard cap on suggestions per note
    pub max_suggestions: usize,
    /// Minimum normalized name length for a candidate
    pub min_match_len: usize,
    /// Multiplier for the exact/stem content layers
    pub content_weight: f64,
    /// Multiplier for the co-occurrence layer
    pub cooccurrence_weight: f64,
    /// Ceiling on the hub layer's contribution
    pub hub_cap: f64,
    /// False-positive posterior at which an entity is suppressed
    pub suppression_cutoff: f64,
}

impl StrictnessProfile {
    /// The profile table. Conservative ⊂ balanced ⊂ aggressive in recall;
    /// the reverse in precision.
    pub fn for_mode(mode: Strictness) -> Self {
        match mode {
            Strictness::Conservative => Self {
                strictness: mode,
                min_score: 15.0,
                max_suggestions: 5,
                min_match_len: 4,
                content_weight: 1.0,
                cooccurrence_weight: 0.5,
                hub_cap: 2.0,
                suppression_cutoff: 0.35,
            },
            Strictness::Balanced => Self {
                strictness: mode,
                min_score: 8.0,
                max_suggestions: 8,
                min_match_len: 3,
                content_weight: 1.0,
                cooccurrence_weight: 1.0,
                hub_cap: 4.0,
                suppression_cutoff: 0.35,
            },
            Strictness::Aggressive => Self {
                strictness: mode,
                min_score: 5.0,
                max_suggestions: 12,
                min_match_len: 2,
                content_weight: 1.2,
                cooccurrence_weight: 1.2,
                hub_cap: 6.0,
                suppression_cutoff: 0.45,
            },
        }
    }

    /// Weight applied to a layer's contribution; 1.0 unless the mode says
    /// otherwise. Never negative.
    pub fn layer_weight(&self, layer: Layer) -> f64 {
        match layer {
            Layer::ExactMatch | Layer::StemMatch => self.content_weight,
            Layer::Cooccurrence => self.cooccurrence_weight,
            _ => 1.0,
        }
    }

    /// Penalty applied to suppressed entities; large enough that no single
    /// layer can rescue the candidate.
    pub fn suppression_penalty(&self) -> f64 {
        (self.min_score + 10.0).max(100.0)
    }
}
