// ABOUTME: Grounded context assembly from documents, meal history, cravings, and the user profile
// ABOUTME: Produces a structured payload and prompt for the generative model without calling it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Grounded Query Assembler
//!
//! Each source is optional. Document chunks are included when any document
//! is loaded, the intake summary when the query talks about eating or
//! nutrients, craving substitutes when the query reads like a craving.
//! A source with nothing to offer makes the context smaller, never fails it,
//! and an empty retrieval is stated in the prompt so the model does not
//! invent document content.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use aafiya_core::models::{
    CravingSuggestion, DocumentId, Macros, MealId, TimeRange, UserProfile,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::catalog::matching::{singularize, tokenize};
use crate::config::{AssemblerConfig, EngineConfig};
use crate::cravings::{mentions_craving, CravingAdvisor, CravingInput};
use crate::documents::DocumentStore;
use crate::llm::{ChatMessage, ChatRequest};
use crate::meal_log::MealLog;
use crate::personas::Persona;
use crate::safety::{screen_query, SafetyFlag};

const NUTRITION_VOCABULARY: &[&str] = &[
    "calorie",
    "calories",
    "kcal",
    "protein",
    "carb",
    "carbohydrate",
    "fat",
    "macro",
    "intake",
    "ate",
    "eaten",
    "eat",
    "eating",
    "meal",
    "nutrition",
    "diet",
    "logged",
    "sugar",
    "fiber",
    "sodium",
    "breakfast",
    "lunch",
    "dinner",
    "snack",
    "consumed",
];

/// Whether the query asks about food intake or nutrients
#[must_use]
pub fn mentions_nutrition(query: &str) -> bool {
    // Raw tokens too: "calories" singularizes to "calory"
    let tokens: BTreeSet<String> = tokenize(query)
        .into_iter()
        .flat_map(|t| [singularize(&t), t])
        .collect();
    NUTRITION_VOCABULARY.iter().any(|word| tokens.contains(*word))
}

/// A document excerpt included in the context
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Source file name
    pub filename: String,
    /// Owning document
    pub document_id: DocumentId,
    /// Chunk position within the document
    pub chunk_index: usize,
    /// Retrieval score
    pub score: u32,
    /// Excerpt text
    pub text: String,
}

/// A logged meal listed in the intake summary
#[derive(Debug, Clone, Serialize)]
pub struct RecentMeal {
    /// Log entry id
    pub id: MealId,
    /// When it was eaten
    pub timestamp: DateTime<Utc>,
    /// User description
    pub description: String,
    /// Meal totals
    pub macros: Macros,
}

/// Meal history over the assembler's window
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSummary {
    /// Window length in days
    pub window_days: u32,
    /// Meals counted in the window
    pub meal_count: usize,
    /// Summed macros over the window
    pub total: Macros,
    /// Average per day, empty days counted as zero
    pub daily_average: Macros,
    /// Most recent meals, newest first
    pub recent_meals: Vec<RecentMeal>,
}

/// Everything handed to the generative model for one query
#[derive(Debug, Clone, Serialize)]
pub struct GroundedContext {
    /// The user's question
    pub query: String,
    /// Active persona
    pub persona: Persona,
    /// Persona system directive
    pub directive: &'static str,
    /// Persona sampling temperature
    pub temperature: f32,
    /// Whether any document was loaded when assembling
    pub documents_loaded: bool,
    /// Retrieved document excerpts, best first
    pub documents: Vec<ContextChunk>,
    /// Intake summary, when the query is about eating
    pub intake: Option<IntakeSummary>,
    /// Craving substitutes, when the query is a craving
    pub cravings: Option<CravingSuggestion>,
    /// Unsafe content matched in the query
    pub safety_flags: Vec<SafetyFlag>,
    /// One-line profile description, when the profile has anything set
    pub profile: Option<String>,
}

/// The session state an assembly reads from
#[derive(Debug, Clone, Copy)]
pub struct ContextSources<'a> {
    /// Uploaded documents
    pub documents: &'a DocumentStore,
    /// Meal history
    pub meals: &'a MealLog,
    /// User profile
    pub profile: &'a UserProfile,
}

/// Builds [`GroundedContext`] values
#[derive(Debug, Clone)]
pub struct GroundedQueryAssembler {
    top_k: usize,
    limits: AssemblerConfig,
    advisor: CravingAdvisor,
}

impl GroundedQueryAssembler {
    /// Assembler using the retrieval, craving, and intake settings of `config`
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            limits: config.assembler.clone(),
            advisor: CravingAdvisor::new(&config.cravings),
        }
    }

    /// Compose the context for `query` as of `now`
    #[must_use]
    pub fn assemble(
        &self,
        query: &str,
        persona: Persona,
        sources: ContextSources<'_>,
        now: DateTime<Utc>,
    ) -> GroundedContext {
        let documents_loaded = !sources.documents.is_empty();
        let documents = if documents_loaded {
            sources
                .documents
                .retrieve(query, self.top_k)
                .into_iter()
                .map(|hit| ContextChunk {
                    filename: hit.filename.to_owned(),
                    document_id: hit.chunk.document_id,
                    chunk_index: hit.chunk.index,
                    score: hit.score,
                    text: hit.chunk.text.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let intake = mentions_nutrition(query).then(|| self.intake_summary(sources.meals, now));
        let cravings = mentions_craving(query)
            .then(|| self.advisor.suggest(CravingInput::Text(query), sources.profile));

        let context = GroundedContext {
            query: query.trim().to_owned(),
            persona,
            directive: persona.directive(),
            temperature: persona.temperature(),
            documents_loaded,
            documents,
            intake,
            cravings,
            safety_flags: screen_query(query),
            profile: describe_profile(sources.profile),
        };
        debug!(
            persona = persona.id(),
            chunks = context.documents.len(),
            intake = context.intake.is_some(),
            cravings = context.cravings.is_some(),
            flags = context.safety_flags.len(),
            "Assembled grounded context"
        );
        context
    }

    fn intake_summary(&self, meals: &MealLog, now: DateTime<Utc>) -> IntakeSummary {
        let days = self.limits.intake_window_days;
        let window = TimeRange::days_ending(now, days);
        let totals = meals.aggregate(window);
        IntakeSummary {
            window_days: days,
            meal_count: totals.entry_count,
            total: totals.macros,
            daily_average: meals.rolling_average(now, days),
            recent_meals: meals
                .recent_within(window, self.limits.recent_meals)
                .into_iter()
                .map(|entry| RecentMeal {
                    id: entry.id(),
                    timestamp: entry.timestamp(),
                    description: entry.description().to_owned(),
                    macros: entry.totals(),
                })
                .collect(),
        }
    }
}

fn describe_profile(profile: &UserProfile) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(goal) = profile.goal {
        parts.push(format!("goal: {}", goal.label()));
    }
    if let Some(metrics) = profile.body_metrics() {
        parts.push(format!("BMI {:.1} ({})", metrics.bmi, metrics.category));
    }
    if !profile.allergies.is_empty() {
        parts.push(format!("allergies: {}", join(&profile.allergies)));
    }
    if !profile.restrictions.is_empty() {
        parts.push(format!("dietary restrictions: {}", join(&profile.restrictions)));
    }
    if !profile.disliked_foods.is_empty() {
        parts.push(format!("dislikes: {}", join(&profile.disliked_foods)));
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl GroundedContext {
    /// System prompt: persona directive followed by every grounding section
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut out = String::from(self.directive);

        if let Some(profile) = &self.profile {
            write!(out, "\n\nUser profile: {profile}.").ok();
        }

        if !self.safety_flags.is_empty() {
            let categories: BTreeSet<String> = self
                .safety_flags
                .iter()
                .map(|f| format!("{:?}", f.category))
                .collect();
            write!(
                out,
                "\n\nSafety: the question touches on {}. Do not encourage harmful practices; \
                 recommend a qualified healthcare professional.",
                categories.into_iter().collect::<Vec<_>>().join(", ")
            )
            .ok();
        }

        if self.documents_loaded {
            if self.documents.is_empty() {
                out.push_str(
                    "\n\nNo uploaded document covers this question. Do not quote or invent \
                     document content.",
                );
            } else {
                out.push_str("\n\n--- RELEVANT NUTRITION INFORMATION ---");
                for chunk in &self.documents {
                    write!(out, "\nFrom {}:\n{}\n", chunk.filename, chunk.text).ok();
                }
                out.push_str("--- END NUTRITION INFORMATION ---");
            }
        }

        if let Some(intake) = &self.intake {
            write!(out, "\n\nLogged intake over the last {} days: ", intake.window_days).ok();
            if intake.meal_count == 0 {
                out.push_str("no meals logged.");
            } else {
                write!(
                    out,
                    "{} meals, {:.0} kcal total, daily average {:.0} kcal \
                     (protein {:.0} g, carbs {:.0} g, fat {:.0} g).",
                    intake.meal_count,
                    intake.total.calories,
                    intake.daily_average.calories,
                    intake.daily_average.protein_g,
                    intake.daily_average.carbs_g,
                    intake.daily_average.fat_g,
                )
                .ok();
                for meal in &intake.recent_meals {
                    write!(
                        out,
                        "\n- {} {}: {:.0} kcal",
                        meal.timestamp.format("%Y-%m-%d %H:%M"),
                        meal.description,
                        meal.macros.calories
                    )
                    .ok();
                }
            }
        }

        if let Some(cravings) = &self.cravings {
            let label = cravings.category.map_or("general", |c| c.as_str());
            if cravings.substitutes.is_empty() {
                write!(
                    out,
                    "\n\nCraving ({label}): every stored alternative conflicts with the user's \
                     allergies or restrictions; do not suggest them."
                )
                .ok();
            } else {
                write!(out, "\n\nHealthier alternatives for this craving ({label}):").ok();
                for item in &cravings.substitutes {
                    write!(
                        out,
                        "\n- {} {}: {} ({})",
                        item.color.emoji(),
                        item.name,
                        item.rationale,
                        item.benefit
                    )
                    .ok();
                }
            }
        }

        out
    }

    /// Full prompt as one string
    #[must_use]
    pub fn render_prompt(&self) -> String {
        format!("{}\n\nUser question: {}", self.system_prompt(), self.query)
    }

    /// Chat request carrying the persona temperature
    #[must_use]
    pub fn to_chat_request(&self) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.query.clone()),
        ])
        .with_temperature(self.temperature)
    }
}
