//! Seed scenarios for the suggestion engine
//!
//! Each test pins one externally-observable behavior end to end: vault on
//! disk, real state store, full engine.

use linkwheel_core::{Strictness, SuggestOptions};
use linkwheel_e2e_tests::harness::EngineHarness;

/// S1: exact match beats its stem sibling
#[test]
fn exact_match_beats_stem() {
    let harness = EngineHarness::with_notes(&[("React.md", "body"), ("Reactive.md", "body")]);

    let options = SuggestOptions {
        strictness: Strictness::Balanced,
        detail: true,
        ..Default::default()
    };
    let response = harness
        .engine
        .suggest("Working with React today", &options)
        .unwrap();

    assert_eq!(response.suggestions, vec!["React"]);
    let detailed = response.detailed.unwrap();
    assert_eq!(detailed.len(), 1);
    assert_eq!(detailed[0].entity, "React");
    assert!(detailed[0].breakdown.content_match > 0.0);
}

/// S2: suppression wins over a strong match, in every mode
#[test]
fn suppression_wins_over_strong_match() {
    let harness = EngineHarness::with_notes(&[(
        "Staging.md",
        "---\naliases: [STG]\n---\nDeployment target notes",
    )]);

    // Twelve rejections drive the posterior accuracy to ~0.07.
    for _ in 0..12 {
        harness
            .engine
            .record_feedback("Staging", "Deploy to stg", "journal/today.md", false)
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
            .suggest("Deploy Staging to (STG) tonight", &options)
            .unwrap();
        assert!(
            response.suggestions.is_empty(),
            "suppressed entity surfaced in {strictness} mode"
        );
    }
}

/// S4: champion boost after twenty clean positives
#[test]
fn champion_boost_reaches_breakdown() {
    let harness = EngineHarness::with_notes(&[("TypeScript.md", "body")]);

    for _ in 0..20 {
        harness
            .engine
            .record_feedback("TypeScript", "TS work", "journal/today.md", true)
            .unwrap();
    }

    assert_eq!(harness.engine.feedback().boost("TypeScript").unwrap(), 10.0);

    let options = SuggestOptions {
        detail: true,
        ..Default::default()
    };
    let response = harness
        .engine
        .suggest("More TypeScript today", &options)
        .unwrap();
    let detailed = response.detailed.unwrap();
    assert_eq!(detailed[0].breakdown.feedback_adjustment, 10.0);
}

/// S5: fenced code is protected; prose still matches
#[test]
fn protected_code_block_is_preserved() {
    let harness = EngineHarness::with_notes(&[("React.md", "body")]);

    let text = "Discussed React today\n```ts\nimport React from 'react';\n```\n";
    let options = SuggestOptions {
        detail: true,
        ..Default::default()
    };
    let response = harness.engine.suggest(text, &options).unwrap();

    // Exactly one suggestion, driven by exactly one (prose) occurrence.
    assert_eq!(response.suggestions, vec!["React"]);
    let detailed = response.detailed.unwrap();
    let single_occurrence = detailed[0].breakdown.content_match;

    let double = harness
        .engine
        .suggest("Discussed React today and React tonight", &options)
        .unwrap();
    assert!(double.detailed.unwrap()[0].breakdown.content_match > single_occurrence);

    // The engine never mutates input text; the block is byte-identical.
    assert!(text.contains("```ts\nimport React from 'react';\n```"));
}

/// S6: recency breaks an otherwise exact tie
#[test]
fn recency_ranks_fresh_entity_first() {
    let harness = EngineHarness::with_notes(&[("tech/Alpha.md", "body"), ("tech/Beta.md", "body")]);

    // Touch both entities: Beta minutes ago, Alpha weeks ago.
    let now = chrono::Utc::now();
    let store = harness.engine.store();
    store
        .touch_recency("Beta", now - chrono::Duration::minutes(10))
        .unwrap();
    store
        .touch_recency("Alpha", now - chrono::Duration::days(25))
        .unwrap();

    let response = harness
        .engine
        .suggest("Alpha and Beta both came up", &SuggestOptions::default())
        .unwrap();
    assert_eq!(response.suggestions[0], "Beta");
    assert_eq!(response.suggestions[1], "Alpha");
}

/// Suffix follows the display contract
#[test]
fn suffix_lists_passing_subset() {
    let harness = EngineHarness::with_notes(&[("React.md", "b"), ("Redux.md", "b")]);

    let response = harness
        .engine
        .suggest("React with Redux", &SuggestOptions::default())
        .unwrap();
    assert_eq!(response.suggestions.len(), 2);
    let expected = format!(
        "→ [[{}]] [[{}]]",
        response.suggestions[0], response.suggestions[1]
    );
    assert_eq!(response.suffix, expected);
}

/// Alias matching respects the short-code guard and the length floor
#[test]
fn alias_short_code_guard() {
    let harness = EngineHarness::with_notes(&[
        (
            "Structured Query Language.md",
            "---\naliases: [SQL]\n---\nbody",
        ),
        ("Machine Learning.md", "---\naliases: [ML]\n---\nbody"),
    ]);

    // Lowercase prose occurrence of a short code: rejected.
    let response = harness
        .engine
        .suggest("wrote some sql yesterday", &SuggestOptions::default())
        .unwrap();
    assert!(response.suggestions.is_empty());

    // Punctuation-bounded uppercase occurrence: accepted.
    let response = harness
        .engine
        .suggest("Optimized the (SQL) layer", &SuggestOptions::default())
        .unwrap();
    assert_eq!(response.suggestions, vec!["Structured Query Language"]);

    // Two-character aliases are never indexed at all.
    let response = harness
        .engine
        .suggest("An (ML) pipeline", &SuggestOptions::default())
        .unwrap();
    assert!(response.suggestions.is_empty());
}
