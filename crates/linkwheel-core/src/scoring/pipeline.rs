//! Scoring Pipeline
//!
//! Deterministic composition of the layer chain: every candidate either
//! drops at one of the two filters or comes out with a full breakdown.
//! Identical inputs produce identical breakdowns.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::feedback::FeedbackView;
use crate::index::{Category, IndexSnapshot, normalize_name};
use crate::profiles::StrictnessProfile;
use crate::semantic::{EdgeWeightProvider, SemanticLayer};
use crate::textmatch::CandidateMatch;

use super::breakdown::{ScoreBreakdown, sanitize};
use super::context::NoteContext;
use super::layers::{
    COOCCURRENCE_SCALE, CONTEXT_BOOST, CROSS_FOLDER_BOOST, EDGE_WEIGHT_SCALE, EXACT_BASE_WEIGHT,
    Layer, OCCURRENCE_CAP, SEMANTIC_SCALE, STEM_RATIO, TYPE_BOOST, hub_boost, is_stop_word,
    recency_boost,
};

/// Everything the pipeline needs for one suggestion call
pub struct PipelineInputs<'a> {
    pub snapshot: &'a IndexSnapshot,
    pub profile: &'a StrictnessProfile,
    pub disabled: &'a HashSet<Layer>,
    pub feedback: &'a FeedbackView,
    /// Per-entity last-touched timestamps, fetched once per call
    pub recency: &'a HashMap<String, DateTime<Utc>>,
    pub semantic: Option<&'a SemanticLayer>,
    pub edge_weights: Option<&'a dyn EdgeWeightProvider>,
    /// "Near" window for the context layer, in tokens
    pub context_window: usize,
    pub now: DateTime<Utc>,
}

impl<'a> PipelineInputs<'a> {
    fn weight(&self, layer: Layer) -> f64 {
        if self.disabled.contains(&layer) {
            0.0
        } else {
            self.profile.layer_weight(layer).max(0.0)
        }
    }
}

/// A fully scored candidate
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub entity_id: usize,
    pub name: String,
    pub category: Category,
    pub breakdown: ScoreBreakdown,
    pub total: f64,
    pub hub_score: u32,
    pub first_offset: usize,
}

/// Run the layer chain over one candidate
///
/// Returns None when a filter layer drops the candidate.
pub fn score_candidate(
    candidate: &CandidateMatch,
    context: &NoteContext,
    note_text: &str,
    inputs: &PipelineInputs<'_>,
) -> Option<ScoredCandidate> {
    let entity = inputs.snapshot.entity(candidate.entity);
    let normalized = normalize_name(&entity.name);

    // 1. length_filter
    if !inputs.disabled.contains(&Layer::LengthFilter)
        && normalized.chars().count() < inputs.profile.min_match_len
    {
        return None;
    }

    // 2. article_filter
    if !inputs.disabled.contains(&Layer::ArticleFilter) && is_stop_word(&normalized) {
        return None;
    }

    let mut breakdown = ScoreBreakdown::default();
    let idf = inputs.snapshot.name_idf_factor(candidate.entity);

    // 3. exact_match (alias occurrences are exact occurrences of an alias)
    let exact_occurrences = (candidate.exact_count + candidate.alias_count).min(OCCURRENCE_CAP);
    breakdown.content_match = sanitize(
        exact_occurrences as f64 * EXACT_BASE_WEIGHT * idf * inputs.weight(Layer::ExactMatch),
    );

    // 4. stem_match
    let stem_occurrences = candidate.stem_count.min(OCCURRENCE_CAP);
    breakdown.content_match += sanitize(
        stem_occurrences as f64
            * EXACT_BASE_WEIGHT
            * STEM_RATIO
            * idf
            * inputs.weight(Layer::StemMatch),
    );

    // 5. cooccurrence: strongest NPMI against any already-linked entity
    let npmi = context
        .linked
        .iter()
        .filter(|&&id| id != candidate.entity)
        .map(|&id| inputs.snapshot.cooccurrence_npmi(candidate.entity, id))
        .fold(0.0f64, f64::max);
    breakdown.cooccurrence_boost =
        sanitize(npmi * COOCCURRENCE_SCALE * inputs.weight(Layer::Cooccurrence));

    // 6. type_boost
    let type_match = context.note_category == Some(entity.category)
        || context.dominant_linked_category == Some(entity.category);
    if type_match {
        breakdown.type_boost = TYPE_BOOST * inputs.weight(Layer::TypeBoost);
    }

    // 7. context_boost
    if let Some(distance) = context.distance_to_nearest_link(candidate.first_token) {
        if distance <= inputs.context_window {
            breakdown.context_boost = CONTEXT_BOOST * inputs.weight(Layer::ContextBoost);
        }
    }

    // 8. recency
    if let Some(&last_touched) = inputs.recency.get(&entity.name) {
        breakdown.recency_boost =
            recency_boost(last_touched, inputs.now) * inputs.weight(Layer::Recency);
    }

    // 9. cross_folder
    if let Some(note_folder) = &context.folder {
        if entity.folder != *note_folder {
            breakdown.cross_folder_boost = CROSS_FOLDER_BOOST * inputs.weight(Layer::CrossFolder);
        }
    }

    // 10. hub_boost
    breakdown.hub_boost =
        hub_boost(entity.hub_score, inputs.profile.hub_cap) * inputs.weight(Layer::HubBoost);

    // 11. feedback: tier boost plus suppression penalty
    let feedback_weight = inputs.weight(Layer::Feedback);
    breakdown.feedback_adjustment =
        sanitize(inputs.feedback.boost(&entity.name) * feedback_weight);
    if inputs.feedback.is_suppressed(&entity.name) {
        breakdown.suppression_penalty =
            sanitize(-inputs.profile.suppression_penalty() * feedback_weight);
    }

    // 12. semantic (optional, degrades to 0)
    if let Some(semantic) = inputs.semantic {
        let weight = inputs.weight(Layer::Semantic);
        let similarity = if weight > 0.0 {
            semantic.similarity(note_text, &entity.name)
        } else {
            0.0
        };
        breakdown.semantic_boost = Some(sanitize(similarity * SEMANTIC_SCALE * weight));
    }

    // 13. edge_weight (optional, degrades to 0)
    if let Some(provider) = inputs.edge_weights {
        let weight = inputs.weight(Layer::EdgeWeight);
        let affinity = context
            .note_path
            .as_deref()
            .and_then(|note| provider.weight(note, &entity.path))
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        breakdown.edge_weight_boost = Some(sanitize(affinity * EDGE_WEIGHT_SCALE * weight));
    }

    let total = breakdown.total();
    Some(ScoredCandidate {
        entity_id: candidate.entity,
        name: entity.name.clone(),
        category: entity.category,
        breakdown,
        total,
        hub_score: entity.hub_score,
        first_offset: candidate.first_start,
    })
}

/// Sort by total score descending, then the tie-breakers: higher hub score,
/// earlier first occurrence, lexicographic name
pub fn rank(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.hub_score.cmp(&a.hub_score))
            .then_with(|| a.first_offset.cmp(&b.first_offset))
            .then_with(|| a.name.cmp(&b.name))
    });
}
