//! Suggestion Engine
//!
//! Top-level entry point binding the index, matcher, scoring pipeline,
//! feedback loop, and observability store. One `suggest` call is pure CPU
//! between its state-store reads at the start and the single event write at
//! the end; a caller that abandons the call before that write persists
//! nothing.

mod options;
mod result;

pub use options::{EngineConfig, MAX_SUGGESTIONS_LIMIT, SuggestOptions};
pub use result::{DetailedSuggestion, SuggestionResponse};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{EngineError, EngineWarning, Result};
use crate::feedback::{EntityJourney, FeedbackStore};
use crate::graph::{GraphHealthReport, analyze_graph, build_graph};
use crate::index::{EntityIndex, IndexStats};
use crate::observability::ObservabilityStore;
use crate::profiles::StrictnessProfile;
use crate::scoring::{
    NoteContext, PipelineInputs, ScoredCandidate, rank, score_candidate,
};
use crate::semantic::{EdgeWeightProvider, EmbeddingProvider, SemanticLayer};
use crate::storage::{StateStore, StoreResult, SuggestionEventRow};
use crate::textmatch::match_entities;
use crate::vault::scan_vault;

/// The suggestion engine
///
/// Explicitly constructed state: the index, the state store, and the two
/// stores over it. Shareable across threads behind an `Arc`.
pub struct SuggestionEngine {
    config: EngineConfig,
    index: Arc<EntityIndex>,
    store: Arc<StateStore>,
    feedback: FeedbackStore,
    observability: ObservabilityStore,
    semantic: Option<SemanticLayer>,
    edge_weights: Option<Arc<dyn EdgeWeightProvider>>,
}

impl SuggestionEngine {
    /// Open the state store and assemble an engine; the index starts
    /// uninitialized
    pub fn new(config: EngineConfig) -> Result<Self> {
        let store = Arc::new(StateStore::new(config.db_path.clone())?);
        let feedback = FeedbackStore::new(store.clone(), config.feedback_half_life_days);
        let observability = ObservabilityStore::new(
            store.clone(),
            config.sub_threshold_sampling_rate,
            config.retention_days,
        );
        Ok(Self {
            config,
            index: Arc::new(EntityIndex::new()),
            store,
            feedback,
            observability,
            semantic: None,
            edge_weights: None,
        })
    }

    /// Attach an embedding provider, enabling the semantic layer
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.semantic = Some(SemanticLayer::new(
            provider,
            self.config.embedding_deadline_ms,
        ));
        self
    }

    /// Attach a note-affinity graph, enabling the edge-weight layer
    pub fn with_edge_weight_provider(mut self, provider: Arc<dyn EdgeWeightProvider>) -> Self {
        self.edge_weights = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    pub fn observability(&self) -> &ObservabilityStore {
        &self.observability
    }

    /// Scan the vault, build the index, and mirror it into the store
    ///
    /// The mirror write is best-effort: the in-memory index is the source
    /// of truth for scoring, the table copy serves external tooling.
    pub fn initialize_index(&self) -> Result<IndexStats> {
        let stats = self
            .index
            .initialize(&self.config.vault_root, &self.config.excluded_folders)?;

        if let Some(snapshot) = self.index.snapshot() {
            if let Err(err) = self
                .store
                .replace_index(snapshot.entities(), snapshot.note_link_rows())
            {
                tracing::warn!(error = %err, "failed to mirror index into state store");
            }
        }
        Ok(stats)
    }

    /// Flag the index stale after a file-system event
    pub fn mark_index_stale(&self) {
        self.index.mark_stale();
    }

    pub fn is_entity_index_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Produce suggestions for a note's text
    pub fn suggest(&self, note_text: &str, options: &SuggestOptions) -> Result<SuggestionResponse> {
        let Some(snapshot) = self.index.snapshot() else {
            return Err(EngineError::IndexNotReady(
                "entity index is not initialized; call initialize_index first".to_string(),
            ));
        };

        let disabled = options.validated_layers()?;
        let profile = StrictnessProfile::for_mode(options.strictness);
        let now = Utc::now();
        let mut warnings: Vec<EngineWarning> = Vec::new();

        let context = NoteContext::build(note_text, options.note_path.as_deref(), &snapshot);
        if context.malformed_frontmatter {
            warnings.push(EngineWarning::MalformedNote {
                message: "frontmatter failed to parse; treated as absent".to_string(),
            });
        }

        // Candidates, minus already-linked entities and the note itself.
        let candidates: Vec<_> = match_entities(note_text, &snapshot)
            .into_iter()
            .filter(|c| !context.linked.contains(&c.entity))
            .filter(|c| {
                context.own_key.as_deref()
                    != Some(crate::index::normalize_name(&snapshot.entity(c.entity).name).as_str())
            })
            .collect();

        // Per-call state-store reads, degrading on failure.
        let mut store_degraded = false;
        let recency: HashMap<String, DateTime<Utc>> = match self.store.recency_map() {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(error = %err, "recency read failed, layer contributes 0");
                store_degraded = true;
                HashMap::new()
            }
        };
        let names: Vec<&str> = candidates
            .iter()
            .map(|c| snapshot.entity(c.entity).name.as_str())
            .collect();
        let feedback_view = self
            .feedback
            .view_for(names.iter().copied(), &profile, now);
        store_degraded |= feedback_view.degraded;

        let inputs = PipelineInputs {
            snapshot: &snapshot,
            profile: &profile,
            disabled: &disabled,
            feedback: &feedback_view,
            recency: &recency,
            semantic: self.semantic.as_ref(),
            edge_weights: self.edge_weights.as_deref(),
            context_window: self.config.context_window_tokens,
            now,
        };

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .filter_map(|c| score_candidate(c, &context, note_text, &inputs))
            .collect();
        rank(&mut scored);

        // Every scored candidate persists, passing or not.
        let note_path = options.note_path.clone().unwrap_or_default();
        let events: Vec<SuggestionEventRow> = scored
            .iter()
            .map(|c| SuggestionEventRow {
                id: 0,
                note_path: note_path.clone(),
                entity: c.name.clone(),
                total_score: c.total,
                breakdown: c.breakdown.clone(),
                threshold: profile.min_score,
                passed: c.total >= profile.min_score,
                strictness: profile.strictness,
                timestamp: now,
            })
            .collect();
        if let Err(err) = self.observability.record_suggestions(&events) {
            tracing::warn!(error = %err, "suggestion events not persisted");
            store_degraded = true;
        }
        if store_degraded {
            warnings.push(EngineWarning::StoreUnavailable {
                message: "state store degraded; conservative defaults substituted".to_string(),
            });
        }

        let cap = options
            .max_suggestions
            .unwrap_or(profile.max_suggestions)
            .min(profile.max_suggestions);
        let passing: Vec<&ScoredCandidate> = scored
            .iter()
            .filter(|c| c.total >= profile.min_score)
            .take(cap)
            .collect();

        let suggestions: Vec<String> = passing.iter().map(|c| c.name.clone()).collect();
        let suffix = SuggestionResponse::suffix_for(&suggestions);
        let detailed = options.detail.then(|| {
            passing
                .iter()
                .map(|c| DetailedSuggestion {
                    entity: c.name.clone(),
                    total_score: c.total,
                    breakdown: c.breakdown.clone(),
                })
                .collect()
        });

        tracing::debug!(
            candidates = scored.len(),
            passing = suggestions.len(),
            strictness = %profile.strictness,
            "suggestion call complete"
        );

        Ok(SuggestionResponse {
            suggestions,
            suffix,
            detailed,
            warnings,
        })
    }

    /// Record one feedback event
    pub fn record_feedback(
        &self,
        entity: &str,
        context: &str,
        note_path: &str,
        correct: bool,
    ) -> StoreResult<()> {
        self.feedback.record(entity, context, note_path, correct)
    }

    /// Record an applied suggestion
    pub fn record_application(&self, entity: &str, note_path: &str) -> StoreResult<()> {
        self.observability.record_application(entity, note_path)
    }

    /// Recompute the suppression list; idempotent
    pub fn refresh_suppressions(&self) -> StoreResult<usize> {
        self.feedback.update_suppression_list()
    }

    /// Journey rollup for one entity
    pub fn journey(&self, entity: &str) -> StoreResult<EntityJourney> {
        self.feedback.journey(entity)
    }

    /// Compute topology metrics over the current vault
    pub fn graph_health(&self) -> Result<GraphHealthReport> {
        let scan = scan_vault(&self.config.vault_root, &self.config.excluded_folders)?;
        let graph = build_graph(&scan.notes);
        let entity_count = self.index.snapshot().map(|s| s.len()).unwrap_or(scan.notes.len());
        Ok(analyze_graph(&graph, entity_count))
    }

    /// Compute and persist one graph snapshot; returns the report and the
    /// batch timestamp
    pub fn record_graph_snapshot(&self) -> Result<(GraphHealthReport, DateTime<Utc>)> {
        let report = self.graph_health()?;
        let hub_top = self
            .index
            .snapshot()
            .map(|s| s.hub_top(10))
            .unwrap_or_default();
        let at = self.observability.record_graph_snapshot(&report, &hub_top)?;
        Ok((report, at))
    }
}
