// ABOUTME: Core data models for the nutrition coaching engine
// ABOUTME: Re-exports nutrition facts, meal entries, documents, profiles, and craving types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Session data owned by the engine. Types whose invariants matter
//! (`FoodFact`, `MealEntry`) keep their fields private and re-validate on
//! deserialization, so persisted data cannot bypass the checks.

mod craving;
mod document;
mod meal;
mod nutrition;
mod profile;

// Nutrition domain
pub use nutrition::{Confidence, FactSource, FoodFact, Macros, NutritionFacts};

// Meal log domain
pub use meal::{MealDraft, MealEntry, MealId, MealOrigin, MealTotals, TimeRange};

// Document domain
pub use document::{DocumentChunk, DocumentFormat, DocumentId, DocumentRecord, DocumentUpload};

// Profile domain
pub use profile::{
    restriction_keywords, ActivityLevel, BmiCategory, BodyMetrics, Goal, ProfileUpdate,
    UserProfile, DAIRY_INGREDIENTS,
};

// Craving domain
pub use craving::{ColorTag, CravingCategory, CravingSuggestion, Substitute};
