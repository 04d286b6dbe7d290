//! # Linkwheel Core
//!
//! Wikilink suggestion engine for a personal knowledge vault of Markdown
//! notes. Given a note's text it proposes entities worth linking, ranked by
//! a layered scoring pipeline and continuously adapted by feedback:
//!
//! - **Entity index**: searchable catalog of linkable notes with categories,
//!   aliases, and hub scores; atomic snapshot swap on rebuild
//! - **Layered scoring**: eleven deterministic layers (plus two optional
//!   provider-backed ones) producing a full per-candidate breakdown
//! - **Strictness modes**: conservative / balanced / aggressive threshold
//!   and weight profiles
//! - **Feedback loop**: Beta-Binomial posterior with time decay, boost
//!   tiers, and suppression of repeat offenders
//! - **Observability**: every scored candidate persisted with its
//!   breakdown; timelines, layer timeseries, and graph-health snapshots
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linkwheel_core::{EngineConfig, SuggestOptions, SuggestionEngine};
//!
//! let engine = SuggestionEngine::new(EngineConfig::new("/path/to/vault"))?;
//! engine.initialize_index()?;
//!
//! let response = engine.suggest("Working with React today", &SuggestOptions::default())?;
//! println!("{}", response.suffix); // → [[React]]
//!
//! // Close the loop when the user accepts or rejects a suggestion
//! engine.record_feedback("React", "Working with React", "daily.md", true)?;
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod engine;
pub mod error;
pub mod feedback;
pub mod fixtures;
pub mod graph;
pub mod index;
pub mod observability;
pub mod profiles;
pub mod scoring;
pub mod semantic;
pub mod storage;
pub mod textmatch;
pub mod vault;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Engine
pub use engine::{
    DetailedSuggestion, EngineConfig, MAX_SUGGESTIONS_LIMIT, SuggestOptions, SuggestionEngine,
    SuggestionResponse,
};

// Errors
pub use error::{EngineError, EngineWarning, Result};

// Index
pub use index::{
    Category, Entity, EntityIndex, IndexLifecycle, IndexSnapshot, IndexStats, LookupHit,
    normalize_name,
};

// Matching
pub use textmatch::{CandidateMatch, MatchKind, Zone, ZoneKind, mask_protected, match_entities};

// Scoring
pub use scoring::{Layer, NoteContext, ScoreBreakdown, ScoredCandidate};

// Profiles
pub use profiles::{Strictness, StrictnessProfile};

// Feedback
pub use feedback::{BoostTier, EntityJourney, FeedbackStore, FeedbackView, Posterior};

// Observability
pub use observability::{
    DashboardData, Granularity, LayerBucket, LayerStatus, ObservabilityStore, SnapshotComparison,
    TimelineEvent,
};

// Graph health
pub use graph::{GraphHealthReport, LinkGraph, analyze_graph, build_graph};

// Storage
pub use storage::{StateStore, StoreError, SuggestionEventRow};

// Semantic providers
pub use semantic::{EdgeWeightProvider, EmbeddingProvider, cosine_similarity};

// Fixtures
pub use fixtures::{Fixture, FixtureEntity, FixtureNote, GroundTruthLink};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        BoostTier, Category, EngineConfig, EngineError, Entity, EntityIndex, Fixture,
        GraphHealthReport, Result, ScoreBreakdown, Strictness, SuggestOptions, SuggestionEngine,
        SuggestionResponse,
    };
}
