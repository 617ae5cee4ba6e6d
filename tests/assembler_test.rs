// ABOUTME: Integration tests for grounded context assembly
// ABOUTME: Validates document grounding, intake summaries, craving sections and safety notes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use aafiya::assembler::{ContextSources, GroundedContext, GroundedQueryAssembler};
use aafiya::config::EngineConfig;
use aafiya::documents::DocumentStore;
use aafiya::llm::MessageRole;
use aafiya::meal_log::MealLog;
use aafiya::models::{FactSource, FoodFact, Goal, MealDraft, MealOrigin, ProfileUpdate, UserProfile};
use aafiya::personas::Persona;
use aafiya::safety::UnsafeCategory;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{facts, init_test_logging, text_upload};

struct Fixture {
    assembler: GroundedQueryAssembler,
    documents: DocumentStore,
    meals: MealLog,
    profile: UserProfile,
    now: DateTime<Utc>,
}

impl Fixture {
    fn new() -> Self {
        init_test_logging();
        let config = EngineConfig::default();
        Self {
            assembler: GroundedQueryAssembler::new(&config),
            documents: DocumentStore::new(&config),
            meals: MealLog::new(),
            profile: UserProfile::default(),
            now: Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap(),
        }
    }

    fn log(&mut self, description: &str, calories: f64, ago: Duration) {
        let item =
            FoodFact::new(facts(description, 100.0, calories), FactSource::LocalCatalog).unwrap();
        let draft =
            MealDraft::now(description, vec![item], MealOrigin::ManualText).at(self.now - ago);
        self.meals.append(draft).unwrap();
    }

    fn ask(&self, query: &str, persona: Persona) -> GroundedContext {
        self.assembler.assemble(
            query,
            persona,
            ContextSources {
                documents: &self.documents,
                meals: &self.meals,
                profile: &self.profile,
            },
            self.now,
        )
    }
}

#[test]
fn test_matching_chunks_are_quoted_with_their_source() {
    let mut fixture = Fixture::new();
    fixture
        .documents
        .ingest(text_upload(
            "runner_guide.txt",
            "Before a long run, eat oatmeal with banana about two hours ahead.",
        ))
        .unwrap();

    let context = fixture.ask("what should I eat before a long run", Persona::default());

    assert!(context.documents_loaded);
    assert_eq!(context.documents.len(), 1);
    let prompt = context.system_prompt();
    assert!(prompt.contains("--- RELEVANT NUTRITION INFORMATION ---"));
    assert!(prompt.contains("From runner_guide.txt:"));
    assert!(prompt.contains("oatmeal with banana"));
    assert!(prompt.contains("--- END NUTRITION INFORMATION ---"));
}

#[test]
fn test_loaded_documents_without_match_are_stated() {
    let mut fixture = Fixture::new();
    fixture
        .documents
        .ingest(text_upload("vitamins.txt", "Vitamin D comes from sunlight."))
        .unwrap();

    let context = fixture.ask("tell me a joke", Persona::default());

    assert!(context.documents_loaded);
    assert!(context.documents.is_empty());
    assert!(context.system_prompt().contains("No uploaded document covers this question"));
}

#[test]
fn test_no_documents_means_no_document_section() {
    let fixture = Fixture::new();

    let context = fixture.ask("what should I eat before a long run", Persona::default());

    assert!(!context.documents_loaded);
    let prompt = context.system_prompt();
    assert!(!prompt.contains("RELEVANT NUTRITION INFORMATION"));
    assert!(!prompt.contains("No uploaded document"));
}

#[test]
fn test_intake_summary_covers_the_window() {
    let mut fixture = Fixture::new();
    fixture.log("oatmeal", 300.0, Duration::hours(30));
    fixture.log("chicken salad", 400.0, Duration::hours(5));
    // Outside the seven day window
    fixture.log("old pizza", 900.0, Duration::days(9));

    let context = fixture.ask("How many calories did I eat this week?", Persona::default());

    let intake = context.intake.as_ref().expect("intake requested");
    assert_eq!(intake.window_days, 7);
    assert_eq!(intake.meal_count, 2);
    assert!((intake.total.calories - 700.0).abs() < 1e-9);
    assert!((intake.daily_average.calories - 100.0).abs() < 1e-9);
    assert_eq!(intake.recent_meals[0].description, "chicken salad");
    assert!(context.system_prompt().contains("2 meals, 700 kcal total"));
}

#[test]
fn test_recent_meals_stay_inside_the_window() {
    let mut fixture = Fixture::new();
    fixture.log("old pizza", 900.0, Duration::days(9));
    fixture.log("oatmeal", 300.0, Duration::hours(3));

    let context = fixture.ask("how many calories did I eat", Persona::default());

    let intake = context.intake.as_ref().unwrap();
    assert_eq!(intake.recent_meals.len(), 1);
    assert_eq!(intake.recent_meals[0].description, "oatmeal");
    assert!(!context.system_prompt().contains("old pizza"));
}

#[test]
fn test_empty_intake_is_explicit() {
    let fixture = Fixture::new();

    let context = fixture.ask("how much protein did I eat today", Persona::default());

    assert_eq!(context.intake.as_ref().unwrap().meal_count, 0);
    assert!(context.system_prompt().contains("no meals logged."));
}

#[test]
fn test_non_nutrition_query_skips_intake() {
    let mut fixture = Fixture::new();
    fixture.log("oatmeal", 300.0, Duration::hours(2));

    let context = fixture.ask("tell me a joke", Persona::default());

    assert!(context.intake.is_none());
}

#[test]
fn test_craving_alternatives_respect_allergies() {
    let mut fixture = Fixture::new();
    fixture.profile.apply(ProfileUpdate {
        add_allergies: vec!["peanut".to_owned()],
        ..ProfileUpdate::default()
    });

    let context = fixture.ask("I want chocolate cake", Persona::default());

    let cravings = context.cravings.as_ref().expect("craving detected");
    assert_eq!(cravings.excluded, 1);
    let prompt = context.system_prompt();
    assert!(prompt.contains("Healthier alternatives for this craving (sweet)"));
    assert!(!prompt.to_lowercase().contains("peanut butter"));
    assert!(prompt.contains("allergies: peanut"));
}

#[test]
fn test_unsafe_query_adds_safety_note() {
    let fixture = Fixture::new();

    let context = fixture.ask("is a crash diet a good idea?", Persona::default());

    assert_eq!(context.safety_flags.len(), 1);
    assert_eq!(context.safety_flags[0].category, UnsafeCategory::ExtremeDieting);
    assert!(context.system_prompt().contains("Safety:"));
}

#[test]
fn test_profile_line_includes_goal_and_bmi() {
    let mut fixture = Fixture::new();
    fixture.profile.apply(ProfileUpdate {
        weight_kg: Some(70.0),
        height_cm: Some(175.0),
        goal: Some(Goal::BuildMuscle),
        ..ProfileUpdate::default()
    });

    let context = fixture.ask("tell me a joke", Persona::default());

    let profile = context.profile.as_deref().unwrap();
    assert!(profile.contains("goal: build muscle"));
    assert!(profile.contains("BMI 22.9"));
}

#[test]
fn test_persona_shapes_directive_and_temperature() {
    let fixture = Fixture::new();

    let context = fixture.ask("tell me a joke", Persona::StrictCoach);
    let request = context.to_chat_request();

    assert!(context.system_prompt().starts_with(Persona::StrictCoach.directive()));
    let temperature = request.temperature.unwrap();
    assert!((temperature - Persona::StrictCoach.temperature()).abs() < f32::EPSILON);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, MessageRole::System);
    assert_eq!(request.messages[1].content, "tell me a joke");
}
