//! Feedback Module
//!
//! Beta-Binomial accuracy model over per-entity accept/reject events, with
//! exponential time decay, boost tiers, and suppression decisions.

mod posterior;
mod store;

pub use posterior::{
    BoostTier, DEFAULT_HALF_LIFE_DAYS, LEARNING_MIN_N_EFF, PRIOR_ALPHA, PRIOR_BETA, Posterior,
    SUPPRESSION_MIN_N_EFF, decay_weight, posterior_from_events,
};
pub use store::{EntityJourney, FeedbackStore, FeedbackView, JourneyStage};
