//! Beta-Binomial Posterior
//!
//! Per-entity accuracy model over accept/reject feedback. Events decay
//! exponentially with a configurable half-life so stale judgments fade
//! instead of locking an entity into a death spiral.

use chrono::{DateTime, Utc};

/// Uniform prior: Beta(1, 1)
pub const PRIOR_ALPHA: f64 = 1.0;
pub const PRIOR_BETA: f64 = 1.0;

/// Default feedback half-life in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// Effective sample count below which an entity is still learning
pub const LEARNING_MIN_N_EFF: f64 = 5.0;

/// Effective sample count required before suppression may apply
pub const SUPPRESSION_MIN_N_EFF: f64 = 10.0;

/// Decayed posterior over an entity's feedback history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posterior {
    pub alpha: f64,
    pub beta: f64,
}

impl Posterior {
    /// Posterior with no observed events
    pub fn prior() -> Self {
        Self {
            alpha: PRIOR_ALPHA,
            beta: PRIOR_BETA,
        }
    }

    /// Posterior mean accuracy α / (α + β)
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Effective sample count α + β − 2
    pub fn n_eff(&self) -> f64 {
        (self.alpha + self.beta - PRIOR_ALPHA - PRIOR_BETA).max(0.0)
    }

    /// False-positive posterior 1 − mean
    pub fn false_positive_rate(&self) -> f64 {
        1.0 - self.mean()
    }
}

/// Contribution weight of an event `age_days` old: 2^(−age / half_life)
pub fn decay_weight(age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    (2f64).powf(-age_days.max(0.0) / half_life_days)
}

/// Fold decayed events into a posterior
pub fn posterior_from_events<I>(events: I, now: DateTime<Utc>, half_life_days: f64) -> Posterior
where
    I: IntoIterator<Item = (bool, DateTime<Utc>)>,
{
    let mut posterior = Posterior::prior();
    for (correct, at) in events {
        let age_days = (now - at).num_seconds() as f64 / 86_400.0;
        let weight = decay_weight(age_days, half_life_days);
        if correct {
            posterior.alpha += weight;
        } else {
            posterior.beta += weight;
        }
    }
    posterior
}

/// Discrete feedback states decided by posterior mean and sample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostTier {
    Learning,
    Weak,
    Developing,
    Strong,
    Champion,
}

impl BoostTier {
    /// Classify a posterior into its tier
    ///
    /// A mean ≥ 0.95 with fewer than 20 effective samples stays Strong
    /// until the evidence reaches Champion volume.
    pub fn classify(posterior: &Posterior) -> Self {
        let mean = posterior.mean();
        let n_eff = posterior.n_eff();
        if n_eff < LEARNING_MIN_N_EFF {
            BoostTier::Learning
        } else if mean < 0.50 {
            BoostTier::Weak
        } else if mean < 0.80 {
            BoostTier::Developing
        } else if mean >= 0.95 && n_eff >= 20.0 {
            BoostTier::Champion
        } else {
            BoostTier::Strong
        }
    }

    /// Signed score adjustment for the feedback layer
    pub fn boost(&self) -> f64 {
        match self {
            BoostTier::Learning => 0.0,
            BoostTier::Weak => -2.0,
            BoostTier::Developing => 1.0,
            BoostTier::Strong => 2.0,
            BoostTier::Champion => 10.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoostTier::Learning => "learning",
            BoostTier::Weak => "weak",
            BoostTier::Developing => "developing",
            BoostTier::Strong => "strong",
            BoostTier::Champion => "champion",
        }
    }
}
