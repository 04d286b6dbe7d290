//! Storage Module
//!
//! SQLite-based state store with:
//! - Mirrored entity and note-link tables
//! - Append-only feedback events, recomputed suppressions
//! - Suggestion events, applications, graph snapshots, recency

mod migrations;
mod store;

pub use migrations::MIGRATIONS;
pub use store::{
    ApplicationRow, FeedbackEventRow, SnapshotMetricRow, StateStore, StoreError, StoreResult,
    SuggestionEventRow, SuppressionRow, TopEntityRow,
};
