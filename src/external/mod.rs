// ABOUTME: External nutrition data sources behind the NutritionSource capability
// ABOUTME: USDA FoodData Central adapter plus canonical unit conversion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External nutrition sources.
//!
//! The resolver only sees the [`NutritionSource`] trait. Implementations
//! report values in canonical units (kcal, grams, milligrams of sodium) for
//! the serving they describe, and return `SourceError::NotFound` for empty or
//! all-zero answers so a miss is never mistaken for a zero-calorie food.

pub mod units;
pub mod usda_client;

use aafiya_core::errors::SourceError;
use aafiya_core::models::NutritionFacts;
use async_trait::async_trait;

pub use usda_client::{FoodDetails, FoodNutrient, FoodSearchResult, UsdaClient, UsdaClientConfig};

/// Capability for querying an external nutrition database
#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Source name used in logs and error messages
    fn name(&self) -> &str;

    /// Look up a normalized food name
    ///
    /// # Errors
    ///
    /// `NotFound` when the source has no usable data, `RateLimited` or
    /// `Unavailable` when the source is degraded
    async fn query(&self, normalized_name: &str) -> Result<NutritionFacts, SourceError>;

    /// Break a composite food into component facts, when the source supports it
    ///
    /// # Errors
    ///
    /// Same failure modes as [`NutritionSource::query`]
    async fn query_components(
        &self,
        _normalized_name: &str,
    ) -> Result<Option<Vec<NutritionFacts>>, SourceError> {
        Ok(None)
    }
}
