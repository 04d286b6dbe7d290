//! Quantified invariants of the suggestion engine

use linkwheel_core::{Strictness, StrictnessProfile, SuggestOptions};
use linkwheel_e2e_tests::harness::{EngineHarness, generate_fixture};

/// Suggestion counts never exceed the mode cap
#[test]
fn suggestion_count_respects_mode_cap() {
    let notes: Vec<(String, String)> = (0..20)
        .map(|i| (format!("tech/Widget{i:02}.md"), "body".to_string()))
        .collect();
    let refs: Vec<(&str, &str)> = notes
        .iter()
        .map(|(p, b)| (p.as_str(), b.as_str()))
        .collect();
    let harness = EngineHarness::with_notes(&refs);

    let text: String = (0..20)
        .map(|i| format!("Widget{i:02} "))
        .collect::<Vec<_>>()
        .join("and ");

    for strictness in Strictness::ALL {
        let profile = StrictnessProfile::for_mode(strictness);
        let options = SuggestOptions {
            strictness,
            ..Default::default()
        };
        let response = harness.engine.suggest(&text, &options).unwrap();
        assert!(
            response.suggestions.len() <= profile.max_suggestions,
            "{strictness} exceeded its cap"
        );
    }
}

/// Total score equals the sum of breakdown fields and is never negative
#[test]
fn total_is_sum_of_breakdown_fields() {
    let harness = EngineHarness::with_notes(&[
        ("tech/React.md", "body"),
        ("tech/Redux.md", "body"),
        ("journal/old.md", "[[React]] [[Redux]]"),
    ]);

    let options = SuggestOptions {
        strictness: Strictness::Aggressive,
        detail: true,
        ..Default::default()
    };
    let response = harness
        .engine
        .suggest("React near [[Redux]] today", &options)
        .unwrap();

    for suggestion in response.detailed.unwrap() {
        let b = &suggestion.breakdown;
        let sum = b.content_match
            + b.cooccurrence_boost
            + b.type_boost
            + b.context_boost
            + b.recency_boost
            + b.cross_folder_boost
            + b.hub_boost
            + b.feedback_adjustment
            + b.suppression_penalty
            + b.semantic_boost.unwrap_or(0.0)
            + b.edge_weight_boost.unwrap_or(0.0);
        assert!((suggestion.total_score - sum.max(0.0)).abs() < 1e-9);
        assert!(suggestion.total_score >= 0.0);
    }
}

/// A note never suggests its own basename
#[test]
fn own_basename_never_suggested() {
    let harness = EngineHarness::with_notes(&[("projects/Linkwheel.md", "body")]);

    let options = SuggestOptions {
        note_path: Some("projects/Linkwheel.md".to_string()),
        ..Default::default()
    };
    let response = harness
        .engine
        .suggest("Linkwheel is coming along, Linkwheel everywhere", &options)
        .unwrap();
    assert!(response.suggestions.is_empty());
}

/// Text already containing [[Entity]] never suggests that entity again
#[test]
fn repeated_application_is_idempotent() {
    let harness = EngineHarness::with_notes(&[("React.md", "body")]);

    let before = harness
        .engine
        .suggest("Shipped the React rewrite", &SuggestOptions::default())
        .unwrap();
    assert_eq!(before.suggestions, vec!["React"]);

    // Apply the suggestion, then re-run on the updated text.
    let applied = "Shipped the [[React]] rewrite";
    let after = harness
        .engine
        .suggest(applied, &SuggestOptions::default())
        .unwrap();
    assert!(after.suggestions.is_empty());
}

/// Round-trip law: extracting wikilinks after application finds the applied set
#[test]
fn applied_links_extract_back() {
    let names = ["React", "TypeScript"];
    let mut text = "Worked on the rewrite".to_string();
    for name in names {
        text.push_str(&format!(" [[{name}]]"));
    }

    let extracted = linkwheel_core::vault::extract_wikilink_targets(&text);
    for name in names {
        assert!(extracted.iter().any(|t| t == name));
    }
}

/// Feedback monotonicity: boost moves 0 → ≥ +2 and stays without negatives
#[test]
fn feedback_boost_monotonic_in_small_n() {
    let harness = EngineHarness::with_notes(&[("React.md", "body")]);
    let feedback = harness.engine.feedback();

    let mut last_boost = feedback.boost("React").unwrap();
    assert_eq!(last_boost, 0.0);

    for i in 0..8 {
        harness
            .engine
            .record_feedback("React", "ctx", "j.md", true)
            .unwrap();
        let boost = feedback.boost("React").unwrap();
        assert!(boost >= last_boost, "boost regressed at event {i}");
        last_boost = boost;
    }
    assert!(last_boost >= 2.0);
}

/// Suppressed entities stay out of suggestions in every mode (fixture-wide)
#[test]
fn suppressed_entity_absent_everywhere() {
    let fixture = generate_fixture(7, 12, 10);
    let harness = EngineHarness::from_fixture(&fixture);

    for _ in 0..12 {
        harness
            .engine
            .record_feedback("Topic001", "ctx", "journal/day000.md", false)
            .unwrap();
    }
    harness.engine.refresh_suppressions().unwrap();

    for strictness in Strictness::ALL {
        let options = SuggestOptions {
            strictness,
            ..Default::default()
        };
        let response = harness
            .engine
            .suggest("Topic001 again, and Topic002 for contrast", &options)
            .unwrap();
        assert!(!response.suggestions.iter().any(|s| s == "Topic001"));
    }
}

/// Zero-weight configuration: disabling every layer yields no suggestions
#[test]
fn disabling_all_layers_zeroes_scores() {
    let harness = EngineHarness::with_notes(&[("React.md", "body")]);

    let options = SuggestOptions {
        disabled_layers: vec![
            "exact_match".into(),
            "stem_match".into(),
            "cooccurrence".into(),
            "type_boost".into(),
            "context_boost".into(),
            "recency".into(),
            "cross_folder".into(),
            "hub_boost".into(),
            "feedback".into(),
        ],
        detail: true,
        ..Default::default()
    };
    let response = harness.engine.suggest("React React React", &options).unwrap();
    assert!(response.suggestions.is_empty());
}

/// Structured error when the index is not ready
#[test]
fn index_not_ready_is_structured() {
    let harness = EngineHarness::new();

    // Build a second engine against the same vault without initializing.
    let mut config = linkwheel_core::EngineConfig::new(harness.vault_path());
    config.db_path = Some(harness.vault_path().join("other.db"));
    let engine = linkwheel_core::SuggestionEngine::new(config).unwrap();

    let err = engine
        .suggest("anything", &SuggestOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), "IndexNotReady");
    assert!(!engine.is_entity_index_ready());
}

/// Invalid fixtures report every concrete missing reference
#[test]
fn invalid_fixture_lists_missing_references() {
    let mut fixture = generate_fixture(3, 4, 2);
    fixture.ground_truth.push(linkwheel_core::GroundTruthLink {
        note_path: "journal/day999.md".to_string(),
        entity: "Nonexistent".to_string(),
        tier: 1,
        reason: String::new(),
    });

    let err = fixture.validate().unwrap_err();
    let linkwheel_core::EngineError::InvalidFixture { missing } = err else {
        panic!("expected InvalidFixture");
    };
    assert_eq!(missing.len(), 2);
}
