//! Engine Error Types
//!
//! Structured error kinds for the suggestion engine. Only `IndexNotReady`
//! and `InvalidFixture` abort a caller's operation; every other failure
//! degrades the result and is surfaced as a warning on the response.

use crate::storage::StoreError;

/// Top-level engine error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `suggest` was called before the entity index finished building
    #[error("index not ready: {0}")]
    IndexNotReady(String),
    /// A fixture references entities or notes that do not exist
    #[error("invalid fixture: {} missing reference(s)", missing.len())]
    InvalidFixture {
        /// Concrete missing references, e.g. `groundTruth[2].entity "React"`
        missing: Vec<String>,
    },
    /// State store read/write failed during a non-degradable operation
    #[error("state store unavailable: {0}")]
    Store(#[from] StoreError),
    /// Vault scan failed (unreadable root, IO error mid-scan)
    #[error("vault scan failed: {0}")]
    Vault(#[from] std::io::Error),
    /// Options record failed validation (range or unknown layer name)
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl EngineError {
    /// Stable error-kind name for structured reporting
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::IndexNotReady(_) => "IndexNotReady",
            EngineError::InvalidFixture { .. } => "InvalidFixture",
            EngineError::Store(_) => "StoreUnavailable",
            EngineError::Vault(_) => "VaultScan",
            EngineError::InvalidOptions(_) => "InvalidOptions",
        }
    }
}

/// Non-fatal degradations attached to a suggestion response
///
/// The enclosing call still succeeds; these record which conservative
/// default was substituted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineWarning {
    /// State store read/write failed; feedback=0, suppressed=false, nothing persisted
    #[serde(rename_all = "camelCase")]
    StoreUnavailable { message: String },
    /// Frontmatter failed to parse; note treated as frontmatter-less
    #[serde(rename_all = "camelCase")]
    MalformedNote { message: String },
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_names() {
        let err = EngineError::IndexNotReady("call initialize first".into());
        assert_eq!(err.kind(), "IndexNotReady");

        let err = EngineError::InvalidFixture {
            missing: vec!["notes[0].path \"x.md\"".into()],
        };
        assert_eq!(err.kind(), "InvalidFixture");
    }

    #[test]
    fn test_invalid_fixture_message_counts_references() {
        let err = EngineError::InvalidFixture {
            missing: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("2 missing"));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warn = EngineWarning::StoreUnavailable {
            message: "disk full".into(),
        };
        let json = serde_json::to_value(&warn).unwrap();
        assert_eq!(json["kind"], "storeUnavailable");
        assert_eq!(json["message"], "disk full");
    }
}
