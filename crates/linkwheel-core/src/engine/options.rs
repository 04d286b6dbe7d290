//! Engine Options
//!
//! Explicit options records: the engine-level configuration and the
//! per-call suggestion options. Unknown keys in a deserialized options
//! payload are rejected.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::EngineError;
use crate::feedback::DEFAULT_HALF_LIFE_DAYS;
use crate::observability::DEFAULT_RETENTION_DAYS;
use crate::profiles::Strictness;
use crate::scoring::{DEFAULT_CONTEXT_WINDOW_TOKENS, Layer};
use crate::semantic::DEFAULT_EMBEDDING_DEADLINE_MS;
use crate::vault::DEFAULT_EXCLUDED_FOLDERS;

/// Hard ceiling on the per-call suggestion cap
pub const MAX_SUGGESTIONS_LIMIT: usize = 20;

/// Engine-level configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Vault root to scan
    pub vault_root: PathBuf,
    /// State-store path override; platform data directory when None
    pub db_path: Option<PathBuf>,
    /// Folders excluded from scans
    pub excluded_folders: Vec<String>,
    /// Feedback decay half-life
    pub feedback_half_life_days: f64,
    /// Observability retention window
    pub retention_days: i64,
    /// Sampling rate for sub-threshold suggestion events (1.0 = all)
    pub sub_threshold_sampling_rate: f64,
    /// Deadline for embedding lookups in the semantic layer
    pub embedding_deadline_ms: u64,
    /// "Near" window for the context layer, in tokens
    pub context_window_tokens: usize,
}

impl EngineConfig {
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            db_path: None,
            excluded_folders: DEFAULT_EXCLUDED_FOLDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            feedback_half_life_days: DEFAULT_HALF_LIFE_DAYS,
            retention_days: DEFAULT_RETENTION_DAYS,
            sub_threshold_sampling_rate: 1.0,
            embedding_deadline_ms: DEFAULT_EMBEDDING_DEADLINE_MS,
            context_window_tokens: DEFAULT_CONTEXT_WINDOW_TOKENS,
        }
    }
}

/// Per-call suggestion options
///
/// Deserializing a payload with keys outside this record fails.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SuggestOptions {
    pub strictness: Strictness,
    /// Per-call cap; the mode cap still applies on top
    pub max_suggestions: Option<usize>,
    /// Layer names (config form, e.g. "cooccurrence") to zero out
    pub disabled_layers: Vec<String>,
    /// Path of the note being edited; enables own-name exclusion and the
    /// folder-sensitive layers
    pub note_path: Option<String>,
    /// Include per-candidate breakdowns in the response
    pub detail: bool,
}

impl SuggestOptions {
    /// Validate ranges and resolve layer names
    pub fn validated_layers(&self) -> Result<HashSet<Layer>, EngineError> {
        if let Some(max) = self.max_suggestions {
            if !(1..=MAX_SUGGESTIONS_LIMIT).contains(&max) {
                return Err(EngineError::InvalidOptions(format!(
                    "maxSuggestions must be in 1..={MAX_SUGGESTIONS_LIMIT}, got {max}"
                )));
            }
        }
        let mut layers = HashSet::new();
        for name in &self.disabled_layers {
            match Layer::parse_name(name) {
                Some(layer) => {
                    layers.insert(layer);
                }
                None => {
                    return Err(EngineError::InvalidOptions(format!(
                        "unknown layer name \"{name}\""
                    )));
                }
            }
        }
        Ok(layers)
    }
}
