// ABOUTME: Integration tests for the per-user coaching session
// ABOUTME: Covers logging resolutions, cancellation without side effects, reset, and teardown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use aafiya::errors::ErrorCode;
use aafiya::models::{CravingCategory, MealId, ProfileUpdate};
use aafiya::personas::Persona;
use aafiya::resolver::FoodMention;
use aafiya::session::CoachingSession;
use common::{
    catalog_session, facts, init_test_logging, resolver_with, test_config, text_upload,
    ScriptedEstimator,
};
use tokio::time::sleep;

fn slow_session(delay: Duration) -> (CoachingSession, Arc<ScriptedEstimator>) {
    init_test_logging();
    let mut config = test_config();
    config.resilience.timeout_ms = 10_000;
    let estimator =
        Arc::new(ScriptedEstimator::answering(facts("Mystery dish", 300.0, 450.0)).after(delay));
    let resolver = resolver_with(&config, None, Some(Arc::clone(&estimator)));
    (CoachingSession::new(&config, resolver), estimator)
}

#[tokio::test]
async fn test_resolved_mention_is_logged() {
    let mut session = catalog_session();

    let logged = session
        .resolve_and_log(&FoodMention::text("2 boiled eggs"))
        .await
        .unwrap();

    assert!(logged.resolution.is_resolved());
    assert_eq!(logged.meal_id, Some(MealId(1)));
    assert_eq!(session.meals().len(), 1);
    let entry = &session.meals().entries()[0];
    assert_eq!(entry.description(), "2 boiled eggs");
    assert!((entry.totals().calories - 156.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_unresolved_mention_is_not_logged() {
    let mut session = catalog_session();

    let logged = session
        .resolve_and_log(&FoodMention::text("zorblax fritters"))
        .await
        .unwrap();

    assert!(!logged.resolution.is_resolved());
    assert!(logged.meal_id.is_none());
    assert!(session.meals().is_empty());
}

#[tokio::test]
async fn test_cancelled_resolution_commits_nothing() {
    let (mut session, estimator) = slow_session(Duration::from_secs(5));
    let handle = session.cancellation_handle();

    tokio::spawn(async move {
        sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });
    let error = session
        .resolve_and_log(&FoodMention::text("glorpnut surprise"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::OperationCancelled);
    assert_eq!(error.context.session_id, Some(session.id()));
    assert_eq!(estimator.calls(), 1);
    assert!(session.meals().is_empty());
}

#[tokio::test]
async fn test_earlier_cancel_does_not_affect_new_work() {
    let (mut session, _estimator) = slow_session(Duration::from_millis(10));
    session.cancellation_handle().cancel();

    let logged = session
        .resolve_and_log(&FoodMention::text("glorpnut surprise"))
        .await
        .unwrap();

    assert_eq!(logged.meal_id, Some(MealId(1)));
}

#[tokio::test]
async fn test_empty_mention_is_rejected() {
    let mut session = catalog_session();

    let error = session
        .resolve_and_log(&FoodMention::text(""))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidInput);
    assert!(session.meals().is_empty());
}

#[tokio::test]
async fn test_reset_keeps_profile_and_persona() {
    let mut session = catalog_session();
    session.update_profile(ProfileUpdate {
        add_allergies: vec!["peanut".to_owned()],
        ..ProfileUpdate::default()
    });
    session.set_persona(Persona::MindfulCoach);
    session
        .resolve_and_log(&FoodMention::text("banana"))
        .await
        .unwrap();
    session
        .ingest_document(text_upload("notes.txt", "Hydrate well."))
        .unwrap();

    session.reset();

    assert!(session.meals().is_empty());
    assert!(session.documents().is_empty());
    assert!(session.profile().allergies.contains("peanut"));
    assert_eq!(session.persona(), Persona::MindfulCoach);
}

#[test]
fn test_profile_update_reports_changes() {
    let mut session = catalog_session();

    let changed = session.update_profile(ProfileUpdate {
        add_restrictions: vec!["Vegan".to_owned()],
        ..ProfileUpdate::default()
    });
    let unchanged = session.update_profile(ProfileUpdate::default());

    assert!(changed);
    assert!(!unchanged);
    assert!(session.profile().restrictions.contains("vegan"));
}

#[test]
fn test_substitutes_use_session_profile() {
    let mut session = catalog_session();
    session.update_profile(ProfileUpdate {
        add_allergies: vec!["peanut".to_owned()],
        ..ProfileUpdate::default()
    });

    let suggestion = session.suggest_substitutes("I want chocolate cake");

    assert_eq!(suggestion.category, Some(CravingCategory::Sweet));
    assert_eq!(suggestion.excluded, 1);
}

#[tokio::test]
async fn test_assemble_reads_session_state() {
    let mut session = catalog_session();
    session.set_persona(Persona::FunChef);
    session
        .resolve_and_log(&FoodMention::text("2 boiled eggs"))
        .await
        .unwrap();
    session
        .ingest_document(text_upload("eggs.txt", "Eggs are a complete protein source."))
        .unwrap();

    let context = session.assemble("how much protein did I eat");

    assert_eq!(context.persona, Persona::FunChef);
    assert_eq!(context.documents.len(), 1);
    assert_eq!(context.intake.as_ref().unwrap().meal_count, 1);
}

#[tokio::test]
async fn test_corrections_and_document_removal() {
    let mut session = catalog_session();
    let logged = session
        .resolve_and_log(&FoodMention::text("2 boiled eggs"))
        .await
        .unwrap();
    let original = logged.meal_id.unwrap();
    let draft = logged.resolution.resolved().unwrap().clone().into_draft();

    let correction = session.log_correction(original, draft).unwrap().id();
    let id = session
        .ingest_document(text_upload("a.txt", "Beans and rice."))
        .unwrap()
        .id;
    session.remove_document(id).unwrap();

    assert_eq!(correction, MealId(2));
    assert!(session.meals().superseded().contains(&original));
    assert_eq!(
        session.remove_document(id).unwrap_err().code,
        ErrorCode::ResourceNotFound
    );
    assert_eq!(session.clear_documents(), 0);
}

#[tokio::test]
async fn test_end_summarizes_session() {
    let mut session = catalog_session();
    let id = session.id();
    session
        .resolve_and_log(&FoodMention::text("apple"))
        .await
        .unwrap();
    session
        .ingest_document(text_upload("a.txt", "Apples have fiber."))
        .unwrap();

    let summary = session.end();

    assert_eq!(summary.session_id, id);
    assert_eq!(summary.meals_logged, 1);
    assert_eq!(summary.documents_loaded, 1);
    assert!(summary.ended_at >= summary.started_at);
}
