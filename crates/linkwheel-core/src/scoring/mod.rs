//! Scoring Module
//!
//! The layered scoring pipeline: ordered, deterministic, and explainable.
//! Each candidate's score is a breakdown with one field per layer.

mod breakdown;
mod context;
mod layers;
mod pipeline;

pub use breakdown::{ScoreBreakdown, sanitize};
pub use context::NoteContext;
pub use layers::{
    CONTEXT_BOOST, COOCCURRENCE_SCALE, CROSS_FOLDER_BOOST, DEFAULT_CONTEXT_WINDOW_TOKENS,
    EDGE_WEIGHT_SCALE, EXACT_BASE_WEIGHT, Layer, OCCURRENCE_CAP, RECENCY_MAX, SEMANTIC_SCALE,
    STEM_RATIO, STOP_WORDS, TYPE_BOOST, hub_boost, is_stop_word, recency_boost,
};
pub use pipeline::{PipelineInputs, ScoredCandidate, rank, score_candidate};
