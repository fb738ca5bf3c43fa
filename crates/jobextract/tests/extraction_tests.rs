//! End-to-end extraction over an on-disk job server database.

mod common;

use std::collections::HashSet;

use common::{cohort_pipeline, JobSpec, PipelineBuilder, TestHarness};
use jobextract::{
    Action, ActionMarkers, DatabaseError, DiagnosticEvent, ExtractError, ExtractOptions,
    ExtractionSession, Job, JobStore, MalformedCommandPolicy,
};

fn collect<S: JobStore>(session: &mut ExtractionSession<S>) -> Vec<(Job, Vec<Action>)> {
    session
        .extract()
        .map(|item| {
            let (job, actions) = item.expect("extraction failed");
            let actions = actions
                .collect::<Result<Vec<_>, _>>()
                .expect("action resolution failed");
            (job, actions)
        })
        .collect()
}

#[test]
fn test_every_row_yields_exactly_one_job() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job_request(2, "jr-two", None);
    for (id, request, action) in [
        (1, 1, "generate_cohort"),
        (2, 2, "run_model"),
        (3, 1, "__error__"),
        (4, 1, "missing"),
        (5, 2, "run_all"),
    ] {
        harness.add_job(JobSpec::new(id, request, action));
    }

    let (mut session, _) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);

    let ids: Vec<i64> = results.iter().map(|(job, _)| job.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_concrete_action_resolves_tool_identity() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(10, 1, "generate_cohort"));

    let (mut session, diagnostics) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);

    assert_eq!(results.len(), 1);
    let (job, actions) = &results[0];
    assert_eq!(job.job_request_id, 1);
    assert_eq!(job.workspace_id, 101);
    assert_eq!(
        actions,
        &vec![Action {
            id: "generate_cohort".to_string(),
            pseudo_id: "generate_cohort".to_string(),
            job_id: 10,
            tool_type: "cohortextractor".to_string(),
            tool_version: "0.5.2".to_string(),
        }]
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn test_fan_out_covers_every_action_once() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(1, 1, "run_all"));

    let (mut session, _) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);
    let actions = &results[0].1;

    assert_eq!(actions.len(), 2);
    let ids: Vec<&str> = actions.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["generate_cohort", "run_model"]);
    assert!(actions.iter().all(|a| a.pseudo_id == "run_all"));
    let distinct: HashSet<&str> = ids.into_iter().collect();
    assert_eq!(distinct.len(), 2);
}

#[test]
fn test_error_marker_and_unknown_action_yield_nothing() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(1, 1, "__error__").status("failed"));
    harness.add_job(JobSpec::new(2, 1, "renamed_action"));

    let (mut session, diagnostics) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, actions)| actions.is_empty()));
    assert_eq!(results[0].0.status, "failed");
    // Unresolved references are not reported.
    assert!(diagnostics.is_empty());
}

#[test]
fn test_missing_pipeline_reports_once_per_job_request() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-empty", None);
    harness.add_job_request(2, "jr-blank", Some(""));
    for id in 1..=3 {
        harness.add_job(JobSpec::new(id, 1, "generate_cohort"));
    }
    harness.add_job(JobSpec::new(4, 2, "run_all"));

    let (mut session, diagnostics) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|(_, actions)| actions.is_empty()));

    let events = diagnostics.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].to_string().contains("jr-empty"));
    assert!(matches!(
        &events[1],
        DiagnosticEvent::PipelineMissing { identifier, .. } if identifier == "jr-blank"
    ));
}

#[test]
fn test_invalid_pipeline_reports_once_regardless_of_job_count() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-bad", Some("version: '3.0'\nactions: not-a-mapping\n"));
    for id in 1..=4 {
        harness.add_job(JobSpec::new(id, 1, "run_all"));
    }

    let (mut session, diagnostics) = harness.session(ExtractOptions::default());
    let results = collect(&mut session);

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|(_, actions)| actions.is_empty()));

    let events = diagnostics.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        DiagnosticEvent::PipelineInvalid { identifier, .. } if identifier == "jr-bad"
    ));
}

#[test]
fn test_pipeline_is_fetched_once_per_job_request() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job_request(2, "jr-two", None);
    for id in 1..=5 {
        harness.add_job(JobSpec::new(id, 1, "generate_cohort"));
    }
    harness.add_job(JobSpec::new(6, 2, "a"));
    harness.add_job(JobSpec::new(7, 2, "b"));

    let (mut session, _) = harness.session(ExtractOptions::default());
    collect(&mut session);

    assert_eq!(session.store().fetches(), 2);
    assert_eq!(session.cache().len(), 2);

    // The cache outlives a single pass over the store.
    let again = collect(&mut session);
    assert_eq!(again.len(), 7);
    assert_eq!(session.store().fetches(), 2);
}

#[test]
fn test_fresh_session_starts_with_empty_cache() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(1, 1, "run_all"));

    let (mut first, _) = harness.session(ExtractOptions::default());
    collect(&mut first);
    assert_eq!(first.store().fetches(), 1);

    let (second, _) = harness.session(ExtractOptions::default());
    assert!(second.cache().is_empty());
    assert_eq!(second.store().fetches(), 0);
}

#[test]
fn test_rows_stream_across_batches_in_order() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    for id in (1..=10).rev() {
        harness.add_job(JobSpec::new(id, 1, "run_model"));
    }

    let store = harness.store_with_batch_size(3);
    let mut session = ExtractionSession::new(store, ExtractOptions::default());
    let ids: Vec<i64> = collect(&mut session).iter().map(|(job, _)| job.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_malformed_command_aborts_by_default() {
    let harness = TestHarness::new();
    let pipeline = PipelineBuilder::new()
        .action("ok", "python:latest ok.py")
        .action("broken", "python broken.py")
        .build();
    harness.add_job_request(1, "jr-one", Some(&pipeline));
    harness.add_job(JobSpec::new(1, 1, "ok"));
    harness.add_job(JobSpec::new(2, 1, "broken"));

    let (mut session, _) = harness.session(ExtractOptions::default());
    let mut stream = session.extract();

    let (_, actions) = stream.next().unwrap().unwrap();
    assert_eq!(actions.count(), 1);

    let (job, mut actions) = stream.next().unwrap().unwrap();
    assert_eq!(job.id, 2);
    assert!(matches!(
        actions.next(),
        Some(Err(ExtractError::MalformedCommand { job_id: 2, .. }))
    ));
}

#[test]
fn test_malformed_command_can_be_skipped() {
    let harness = TestHarness::new();
    let pipeline = PipelineBuilder::new()
        .action("ok", "python:latest ok.py")
        .action("broken", "'unterminated")
        .build();
    harness.add_job_request(1, "jr-one", Some(&pipeline));
    harness.add_job(JobSpec::new(1, 1, "run_all"));

    let options = ExtractOptions {
        markers: ActionMarkers::default(),
        malformed_commands: MalformedCommandPolicy::Skip,
    };
    let (mut session, diagnostics) = harness.session(options);
    let results = collect(&mut session);

    let ids: Vec<&str> = results[0].1.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["ok"]);
    assert!(matches!(
        diagnostics.events().as_slice(),
        [DiagnosticEvent::MalformedCommand { action_id, .. }] if action_id == "broken"
    ));
}

#[test]
fn test_custom_markers() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(1, 1, "everything"));
    harness.add_job(JobSpec::new(2, 1, "run_all"));

    let options = ExtractOptions {
        markers: ActionMarkers {
            fan_out: "everything".to_string(),
            error: "__error__".to_string(),
        },
        malformed_commands: MalformedCommandPolicy::Fatal,
    };
    let (mut session, _) = harness.session(options);
    let results = collect(&mut session);

    assert_eq!(results[0].1.len(), 2);
    assert!(results[1].1.is_empty());
}

#[test]
fn test_dangling_job_request_lookup_is_a_store_error() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job(JobSpec::new(1, 1, "run_all"));

    let store = harness.store();
    let mut session = ExtractionSession::new(store, ExtractOptions::default());
    assert_eq!(session.extract().count(), 1);

    // Rows come from the join, so a dangling job request never reaches the
    // resolver; looking one up directly is a store error.
    assert!(matches!(
        session.store().fetch_pipeline_text(999),
        Err(DatabaseError::JobRequestNotFound(999))
    ));
}

#[test]
fn test_job_summaries_carry_optional_action_identity() {
    let harness = TestHarness::new();
    harness.add_job_request(1, "jr-one", Some(&cohort_pipeline()));
    harness.add_job_request(2, "jr-none", None);
    harness.add_job(JobSpec::new(1, 1, "run_model").completed_at("2021-06-01 13:00:00"));
    harness.add_job(JobSpec::new(2, 1, "run_all"));
    harness.add_job(JobSpec::new(3, 2, "run_model"));

    let (mut session, diagnostics) = harness.session(ExtractOptions::default());
    let summaries: Vec<_> = session
        .extract_job_summaries()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].action_type.as_deref(), Some("stata-mp"));
    assert_eq!(summaries[0].action_version.as_deref(), Some("latest"));
    assert!(summaries[0].completed_at.is_some());
    assert_eq!(summaries[1].action_id, "run_all");
    assert!(summaries[1].action_type.is_none());
    assert!(summaries[2].action_type.is_none());
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_job_summary_ignores_document_action_named_like_a_marker() {
    let harness = TestHarness::new();
    let pipeline = PipelineBuilder::new()
        .action("__error__", "python:latest cleanup.py")
        .build();
    harness.add_job_request(1, "jr-one", Some(&pipeline));
    harness.add_job(JobSpec::new(1, 1, "__error__").status("failed"));

    let (mut session, _) = harness.session(ExtractOptions::default());
    let summaries: Vec<_> = session
        .extract_job_summaries()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(summaries[0].action_type.is_none());

    let results = collect(&mut session);
    assert!(results[0].1.is_empty());
}

#[test]
fn test_run_all_stays_reserved_with_custom_fan_out_marker() {
    let harness = TestHarness::new();
    let pipeline = PipelineBuilder::new()
        .action("run_all", "python:latest everything.py")
        .build();
    harness.add_job_request(1, "jr-one", Some(&pipeline));
    harness.add_job(JobSpec::new(1, 1, "run_all"));

    let options = ExtractOptions {
        markers: ActionMarkers {
            fan_out: "everything".to_string(),
            error: "__error__".to_string(),
        },
        malformed_commands: MalformedCommandPolicy::Fatal,
    };
    let (mut session, diagnostics) = harness.session(options);
    let results = collect(&mut session);

    assert!(results[0].1.is_empty());
    assert!(matches!(
        diagnostics.events().as_slice(),
        [DiagnosticEvent::PipelineInvalid { error, .. }] if error.contains("reserved")
    ));
}
