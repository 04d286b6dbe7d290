//! Layer Definitions
//!
//! Named layers of the scoring chain, their base weights, and the shared
//! decay curves. Contributions here are pre-mode-weight; the pipeline
//! multiplies by the profile's per-layer weight.

use chrono::{DateTime, Utc};

use crate::scoring::breakdown::sanitize;

/// Base points per exact occurrence, before IDF and mode weight
pub const EXACT_BASE_WEIGHT: f64 = 10.0;

/// Stem occurrences are worth a fraction of exact ones
pub const STEM_RATIO: f64 = 0.4;

/// Occurrences counted per kind; repetition beyond this adds nothing
pub const OCCURRENCE_CAP: u32 = 3;

/// Scale applied to the capped NPMI in the co-occurrence layer
pub const COOCCURRENCE_SCALE: f64 = 5.0;

/// Flat boost when the candidate's category matches the note's
pub const TYPE_BOOST: f64 = 3.0;

/// Flat boost when the candidate sits near an already-linked entity
pub const CONTEXT_BOOST: f64 = 2.0;

/// Default "near" window, in tokens
pub const DEFAULT_CONTEXT_WINDOW_TOKENS: usize = 50;

/// Full recency boost, held for the first hour
pub const RECENCY_MAX: f64 = 3.0;

/// Age at which the recency boost reaches zero
pub const RECENCY_ZERO_HOURS: f64 = 30.0 * 24.0;

/// Flat boost for knitting across folders
pub const CROSS_FOLDER_BOOST: f64 = 1.0;

/// Scale applied to cosine similarity in the semantic layer
pub const SEMANTIC_SCALE: f64 = 5.0;

/// Scale applied to the note-affinity weight in the edge-weight layer
pub const EDGE_WEIGHT_SCALE: f64 = 4.0;

/// The ordered layer chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    LengthFilter,
    ArticleFilter,
    ExactMatch,
    StemMatch,
    Cooccurrence,
    TypeBoost,
    ContextBoost,
    Recency,
    CrossFolder,
    HubBoost,
    Feedback,
    Semantic,
    EdgeWeight,
}

impl Layer {
    /// Chain order as applied by the pipeline
    pub const ALL: [Layer; 13] = [
        Layer::LengthFilter,
        Layer::ArticleFilter,
        Layer::ExactMatch,
        Layer::StemMatch,
        Layer::Cooccurrence,
        Layer::TypeBoost,
        Layer::ContextBoost,
        Layer::Recency,
        Layer::CrossFolder,
        Layer::HubBoost,
        Layer::Feedback,
        Layer::Semantic,
        Layer::EdgeWeight,
    ];

    /// Configuration name, as accepted by `disabled_layers`
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::LengthFilter => "length_filter",
            Layer::ArticleFilter => "article_filter",
            Layer::ExactMatch => "exact_match",
            Layer::StemMatch => "stem_match",
            Layer::Cooccurrence => "cooccurrence",
            Layer::TypeBoost => "type_boost",
            Layer::ContextBoost => "context_boost",
            Layer::Recency => "recency",
            Layer::CrossFolder => "cross_folder",
            Layer::HubBoost => "hub_boost",
            Layer::Feedback => "feedback",
            Layer::Semantic => "semantic",
            Layer::EdgeWeight => "edge_weight",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        Layer::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

/// Pure English articles, pronouns, and prepositions a candidate name must
/// not collapse to
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "me", "my", "mine", "we", "us", "our", "you", "your", "he", "him",
    "his", "she", "her", "it", "its", "they", "them", "their", "this", "that", "these", "those",
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "of", "off",
    "over", "under", "and", "or", "nor", "but", "so", "as", "if", "than",
];

/// Whether a normalized name is on the stop list
pub fn is_stop_word(normalized: &str) -> bool {
    STOP_WORDS.contains(&normalized)
}

/// Recency boost on a log-decay curve
///
/// Full boost for the first hour, then discounted along a log curve that
/// reaches zero at thirty days.
pub fn recency_boost(last_touched: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - last_touched).num_seconds() as f64 / 3600.0;
    if age_hours <= 1.0 {
        return RECENCY_MAX;
    }
    let factor = 1.0 - age_hours.ln() / RECENCY_ZERO_HOURS.ln();
    sanitize(RECENCY_MAX * factor).clamp(0.0, RECENCY_MAX)
}

/// Hub boost: log of the hub score, capped per mode
pub fn hub_boost(hub_score: u32, cap: f64) -> f64 {
    sanitize((1.0 + hub_score as f64).ln()).min(cap).max(0.0)
}
