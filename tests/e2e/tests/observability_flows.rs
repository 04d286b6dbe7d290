//! Observability flows: timeline, timeseries, dashboard, journey, purge

use linkwheel_core::{Granularity, LayerStatus, Strictness, SuggestOptions};
use linkwheel_e2e_tests::harness::EngineHarness;

#[test]
fn every_scored_candidate_lands_in_timeline() {
    let harness = EngineHarness::with_notes(&[("React.md", "b"), ("Obscure.md", "b")]);

    // React passes; the stem-only Obscure mention fails the threshold.
    harness
        .engine
        .suggest(
            "React ships; Obscures abound",
            &SuggestOptions {
                strictness: Strictness::Conservative,
                ..Default::default()
            },
        )
        .unwrap();

    let obs = harness.engine.observability();
    let passed = obs.entity_score_timeline("React", 7, 10).unwrap();
    let failed = obs.entity_score_timeline("Obscure", 7, 10).unwrap();

    assert_eq!(passed.len(), 1);
    assert!(passed[0].passed);
    assert_eq!(passed[0].threshold, 15.0);
    assert_eq!(failed.len(), 1);
    assert!(!failed[0].passed);
    assert!(failed[0].breakdown.content_match > 0.0);
}

#[test]
fn layer_timeseries_buckets_by_day() {
    let harness = EngineHarness::with_notes(&[("React.md", "b")]);
    for _ in 0..3 {
        harness
            .engine
            .suggest("React again", &SuggestOptions::default())
            .unwrap();
    }

    let buckets = harness
        .engine
        .observability()
        .layer_contribution_timeseries(Granularity::Day, 7)
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].events, 3);

    // Same events, week granularity: still one bucket, same average.
    let weekly = harness
        .engine
        .observability()
        .layer_contribution_timeseries(Granularity::Week, 7)
        .unwrap();
    assert_eq!(weekly.len(), 1);
    assert_eq!(
        weekly[0].averages["contentMatch"],
        buckets[0].averages["contentMatch"]
    );
    assert!(weekly[0].bucket.contains("-W"));
}

#[test]
fn dashboard_reflects_feedback_and_suppressions() {
    let harness = EngineHarness::with_notes(&[("React.md", "b"), ("Staging.md", "b")]);

    harness
        .engine
        .suggest("React works", &SuggestOptions::default())
        .unwrap();
    for _ in 0..12 {
        harness
            .engine
            .record_feedback("Staging", "ctx", "j.md", false)
            .unwrap();
    }
    harness
        .engine
        .record_feedback("React", "ctx", "j.md", true)
        .unwrap();
    harness.engine.refresh_suppressions().unwrap();
    harness.engine.record_application("React", "j.md").unwrap();

    let dashboard = harness
        .engine
        .observability()
        .extended_dashboard_data()
        .unwrap();

    assert_eq!(dashboard.totals.suggestions, 1);
    assert_eq!(dashboard.totals.applications, 1);
    assert_eq!(dashboard.totals.feedback_positive, 1);
    assert_eq!(dashboard.totals.feedback_negative, 12);
    assert_eq!(dashboard.suppressions.len(), 1);
    assert_eq!(dashboard.suppressions[0].entity, "Staging");
    assert_eq!(dashboard.sub_threshold_sampling_rate, 1.0);
    assert_eq!(
        dashboard.layer_status["contentMatch"],
        LayerStatus::Contributing
    );
    assert_eq!(
        dashboard.layer_status["semanticBoost"],
        LayerStatus::ZeroData
    );
    assert!(!dashboard.top_entities.is_empty());
    assert_eq!(dashboard.top_entities[0].entity, "React");
}

#[test]
fn journey_tracks_all_five_stages() {
    let harness = EngineHarness::with_notes(&[("React.md", "b")]);

    harness
        .engine
        .suggest("React day", &SuggestOptions::default())
        .unwrap();
    harness.engine.record_application("React", "j.md").unwrap();
    for _ in 0..6 {
        harness
            .engine
            .record_feedback("React", "ctx", "j.md", true)
            .unwrap();
    }

    let journey = harness.engine.journey("React").unwrap();
    assert_eq!(journey.entity, "React");
    assert_eq!(journey.discover.count, 1);
    assert_eq!(journey.suggest.count, 1);
    assert_eq!(journey.apply.count, 1);
    assert_eq!(journey.learn.count, 6);
    assert!(journey.adapt.samples[0].contains("tier strong"));
}

#[test]
fn application_touches_recency() {
    let harness = EngineHarness::with_notes(&[("React.md", "b")]);
    assert!(
        harness
            .engine
            .store()
            .last_touched("React")
            .unwrap()
            .is_none()
    );

    harness.engine.record_application("React", "j.md").unwrap();
    assert!(
        harness
            .engine
            .store()
            .last_touched("React")
            .unwrap()
            .is_some()
    );
}

#[test]
fn graph_snapshot_comparison_tracks_hub_changes() {
    let harness = EngineHarness::with_notes(&[("React.md", "b"), ("journal/a.md", "[[React]]")]);

    let (_, t1) = harness.engine.record_graph_snapshot().unwrap();

    // A new note links React again: hub score rises, orphans change.
    harness.write_note("journal/b.md", "more [[React]] praise");
    let (_, t2) = harness.engine.record_graph_snapshot().unwrap();

    let cmp = harness
        .engine
        .observability()
        .compare_graph_snapshots(t1, t2)
        .unwrap()
        .unwrap();

    let note_count = cmp
        .metric_changes
        .iter()
        .find(|c| c.metric == "note_count")
        .unwrap();
    assert_eq!(note_count.delta, 1.0);

    let react = cmp
        .hub_score_changes
        .iter()
        .find(|c| c.entity == "React")
        .unwrap();
    assert_eq!((react.from, react.to), (1, 2));
}

#[test]
fn suggestion_flow_still_succeeds_with_warnings() {
    let harness = EngineHarness::with_notes(&[("React.md", "b")]);

    // Malformed frontmatter degrades, never fails.
    let response = harness
        .engine
        .suggest("---\ntype: [oops\n---\nReact body", &SuggestOptions::default())
        .unwrap();
    assert_eq!(response.suggestions, vec!["React"]);
    assert!(!response.warnings.is_empty());
}
