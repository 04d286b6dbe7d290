//! Suggestion Result
//!
//! Wire shape of a suggestion call: ordered names, the display suffix, and
//! optionally the per-candidate breakdowns.

use serde::Serialize;

use crate::error::EngineWarning;
use crate::scoring::ScoreBreakdown;

/// One suggestion with its full score decomposition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedSuggestion {
    pub entity: String,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Result of one `suggest` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    /// Passing entities, best first, display names verbatim
    pub suggestions: Vec<String>,
    /// `→ [[Name1]] [[Name2]]` for the passing subset; empty when none pass
    pub suffix: String,
    /// Per-candidate breakdowns, present when `detail` was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed: Option<Vec<DetailedSuggestion>>,
    /// Non-fatal degradations that occurred during the call
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<EngineWarning>,
}

impl SuggestionResponse {
    /// Empty response carrying only warnings
    pub fn empty() -> Self {
        Self {
            suggestions: Vec::new(),
            suffix: String::new(),
            detailed: None,
            warnings: Vec::new(),
        }
    }

    /// Build the display suffix for a passing set
    pub fn suffix_for(names: &[String]) -> String {
        if names.is_empty() {
            return String::new();
        }
        let links: Vec<String> = names.iter().map(|n| format!("[[{n}]]")).collect();
        format!("→ {}", links.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_format() {
        let names = vec!["React".to_string(), "TypeScript".to_string()];
        assert_eq!(
            SuggestionResponse::suffix_for(&names),
            "→ [[React]] [[TypeScript]]"
        );
        assert_eq!(SuggestionResponse::suffix_for(&[]), "");
    }

    #[test]
    fn test_response_serializes_lean_when_empty() {
        let response = SuggestionResponse::empty();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("detailed").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["suggestions"], serde_json::json!([]));
    }
}
