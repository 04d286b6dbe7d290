//! Feedback Store
//!
//! Records accept/reject events, exposes the posterior-derived boost tier
//! and suppression decision per entity, and answers journey queries.
//!
//! Reads go to the state store on each suggestion call; the only caching is
//! the per-call `FeedbackView` the engine builds for one batch of
//! candidates. All operations are best-effort from the engine's
//! perspective: a failed read degrades to boost 0 / not suppressed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::profiles::StrictnessProfile;
use crate::storage::{StateStore, StoreResult};

use super::posterior::{
    BoostTier, Posterior, SUPPRESSION_MIN_N_EFF, posterior_from_events,
};

/// Per-call feedback snapshot for one batch of candidates
#[derive(Debug, Clone, Default)]
pub struct FeedbackView {
    boosts: HashMap<String, f64>,
    suppressed: HashSet<String>,
    /// True when the store was unreachable and defaults were substituted
    pub degraded: bool,
}

impl FeedbackView {
    pub fn boost(&self, entity: &str) -> f64 {
        self.boosts.get(entity).copied().unwrap_or(0.0)
    }

    pub fn is_suppressed(&self, entity: &str) -> bool {
        self.suppressed.contains(entity)
    }

    /// Programmatic construction, for harnesses that bypass the store
    pub fn set_boost(&mut self, entity: &str, boost: f64) {
        self.boosts.insert(entity.to_string(), boost);
    }

    pub fn set_suppressed(&mut self, entity: &str) {
        self.suppressed.insert(entity.to_string());
    }
}

/// Aggregated counts and most-recent samples for one journey stage
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStage {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_at: Option<DateTime<Utc>>,
    pub samples: Vec<String>,
}

/// Discover → suggest → apply → learn → adapt rollup for one entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityJourney {
    pub entity: String,
    pub discover: JourneyStage,
    pub suggest: JourneyStage,
    pub apply: JourneyStage,
    pub learn: JourneyStage,
    pub adapt: JourneyStage,
}

/// Feedback store over the shared state store
pub struct FeedbackStore {
    store: Arc<StateStore>,
    half_life_days: f64,
}

impl FeedbackStore {
    pub fn new(store: Arc<StateStore>, half_life_days: f64) -> Self {
        Self {
            store,
            half_life_days,
        }
    }

    /// Append one feedback event at the current time and touch recency
    pub fn record(
        &self,
        entity: &str,
        context: &str,
        note_path: &str,
        correct: bool,
    ) -> StoreResult<()> {
        let now = Utc::now();
        self.store
            .insert_feedback(entity, context, note_path, correct, now)?;
        self.store.touch_recency(entity, now)?;
        Ok(())
    }

    /// Decayed posterior over the entity's full history
    pub fn posterior_for(&self, entity: &str, now: DateTime<Utc>) -> StoreResult<Posterior> {
        let events = self.store.feedback_events(entity)?;
        Ok(posterior_from_events(
            events.iter().map(|e| (e.correct, e.timestamp)),
            now,
            self.half_life_days,
        ))
    }

    /// Current boost tier for the entity
    pub fn tier(&self, entity: &str) -> StoreResult<BoostTier> {
        Ok(BoostTier::classify(&self.posterior_for(entity, Utc::now())?))
    }

    /// Current signed boost for the entity
    pub fn boost(&self, entity: &str) -> StoreResult<f64> {
        Ok(self.tier(entity)?.boost())
    }

    /// Whether the entity is suppressed under the given mode
    pub fn is_suppressed(&self, entity: &str, profile: &StrictnessProfile) -> StoreResult<bool> {
        Ok(self
            .store
            .suppression_for(entity)?
            .is_some_and(|row| row.false_positive_rate >= profile.suppression_cutoff))
    }

    /// Recompute every suppression row; idempotent and safe to retry
    ///
    /// An entity gets a row when its decayed effective sample count reaches
    /// the suppression minimum; the row stores the false-positive posterior
    /// and each mode applies its own cutoff at read time.
    pub fn update_suppression_list(&self) -> StoreResult<usize> {
        let now = Utc::now();
        let mut tracked = 0;
        for entity in self.store.feedback_entities()? {
            let posterior = self.posterior_for(&entity, now)?;
            if posterior.n_eff() >= SUPPRESSION_MIN_N_EFF {
                self.store.upsert_suppression(
                    &entity,
                    posterior.false_positive_rate(),
                    now,
                )?;
                tracked += 1;
            } else {
                self.store.clear_suppression(&entity)?;
            }
        }
        tracing::info!(tracked, "suppression list refreshed");
        Ok(tracked)
    }

    /// Build the per-call view for one batch of candidates; best-effort
    ///
    /// Any store failure degrades the whole view to boost 0 / no
    /// suppression and flags it, per the propagation policy.
    pub fn view_for<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a str>,
        profile: &StrictnessProfile,
        now: DateTime<Utc>,
    ) -> FeedbackView {
        let mut view = FeedbackView::default();
        for entity in entities {
            match self.posterior_for(entity, now) {
                Ok(posterior) => {
                    let boost = BoostTier::classify(&posterior).boost();
                    if boost != 0.0 {
                        view.boosts.insert(entity.to_string(), boost);
                    }
                }
                Err(err) => {
                    tracing::warn!(entity, error = %err, "feedback read failed, using boost 0");
                    view.degraded = true;
                    continue;
                }
            }
            match self.is_suppressed(entity, profile) {
                Ok(true) => {
                    view.suppressed.insert(entity.to_string());
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(entity, error = %err, "suppression read failed, not suppressing");
                    view.degraded = true;
                }
            }
        }
        view
    }

    /// Aggregated journey for observability dashboards
    pub fn journey(&self, entity: &str) -> StoreResult<EntityJourney> {
        let now = Utc::now();

        let discover = match self.store.entity_by_name(entity)? {
            Some(row) => JourneyStage {
                count: 1,
                last_at: None,
                samples: vec![format!("{} ({})", row.path, row.category)],
            },
            None => JourneyStage::default(),
        };

        let events = self
            .store
            .suggestion_events_for_entity(entity, DateTime::UNIX_EPOCH, 5)?;
        let suggest = JourneyStage {
            count: events.len() as u64,
            last_at: events.last().map(|e| e.timestamp),
            samples: events.iter().rev().map(|e| e.note_path.clone()).collect(),
        };

        let applications = self.store.applications_for(entity)?;
        let apply = JourneyStage {
            count: applications.len() as u64,
            last_at: applications.first().map(|a| a.applied_at),
            samples: applications
                .iter()
                .take(5)
                .map(|a| a.note_path.clone())
                .collect(),
        };

        let feedback = self.store.feedback_events(entity)?;
        let learn = JourneyStage {
            count: feedback.len() as u64,
            last_at: feedback.last().map(|e| e.timestamp),
            samples: feedback
                .iter()
                .rev()
                .take(5)
                .map(|e| {
                    format!(
                        "{} {}",
                        if e.correct { "accepted" } else { "rejected" },
                        e.context
                    )
                })
                .collect(),
        };

        let posterior = posterior_from_events(
            feedback.iter().map(|e| (e.correct, e.timestamp)),
            now,
            self.half_life_days,
        );
        let tier = BoostTier::classify(&posterior);
        let suppression = self.store.suppression_for(entity)?;
        let adapt = JourneyStage {
            count: suppression.is_some() as u64,
            last_at: suppression.as_ref().map(|s| s.updated_at),
            samples: vec![match &suppression {
                Some(s) => format!(
                    "tier {} (boost {:+}), fp rate {:.3}",
                    tier.as_str(),
                    tier.boost(),
                    s.false_positive_rate
                ),
                None => format!("tier {} (boost {:+})", tier.as_str(), tier.boost()),
            }],
        };

        Ok(EntityJourney {
            entity: entity.to_string(),
            discover,
            suggest,
            apply,
            learn,
            adapt,
        })
    }
}
