// ABOUTME: Nutrition resolution ladder from local catalog to external database to AI estimate
// ABOUTME: Produces tagged results with confidence and safety warnings, or an unresolved report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutrition Resolver
//!
//! Resolves a food mention by trying, in order:
//!
//! 1. the built-in [`FoodCatalog`] (exact, then fuzzy name match)
//! 2. an external [`NutritionSource`] such as USDA `FoodData` Central
//! 3. an [`EstimationAdapter`] backed by a generative model
//!
//! Each external call has a bounded timeout and one retry for transient
//! failures. When every tier fails the result is [`Resolution::Unresolved`]
//! with the reason for each attempt; zero values are never invented.

mod retry;

pub use retry::{call_with_retry, Transient};

use std::collections::BTreeSet;
use std::sync::Arc;

use aafiya_core::errors::{AppError, AppResult, EstimationError, SourceError};
use aafiya_core::models::{
    Confidence, FactSource, FoodFact, Macros, MealDraft, MealOrigin, UserProfile,
};
use serde::Serialize;
use tracing::debug;

use crate::catalog::matching::{parse_mention, split_conjunctions, ParsedMention};
use crate::catalog::{CatalogEntry, FoodCatalog};
use crate::config::{EngineConfig, ResilienceConfig, ResolverConfig};
use crate::estimation::{EstimationAdapter, EstimationInput};
use crate::external::NutritionSource;
use crate::llm::ImageInput;
use crate::logging::EngineLogger;
use crate::safety::{self, SafetyWarning};

/// Something the user ate, as typed or photographed
#[derive(Debug, Clone)]
pub enum FoodMention {
    /// Free-text description such as "2 boiled eggs"
    Text(String),
    /// Meal photo
    Image {
        /// The photo
        image: ImageInput,
        /// Optional caption typed alongside the photo
        caption: Option<String>,
    },
}

impl FoodMention {
    /// Text mention
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Photo mention
    #[must_use]
    pub const fn image(image: ImageInput, caption: Option<String>) -> Self {
        Self::Image { image, caption }
    }

    /// Short description for logs and meal entries
    #[must_use]
    pub fn describe(&self) -> &str {
        match self {
            Self::Text(text) => text.trim(),
            Self::Image { caption, .. } => caption.as_deref().unwrap_or("meal photo"),
        }
    }

    /// Capture channel for a meal logged from this mention
    #[must_use]
    pub const fn origin(&self) -> MealOrigin {
        match self {
            Self::Text(_) => MealOrigin::ManualText,
            Self::Image { .. } => MealOrigin::ImageAnalysis,
        }
    }
}

/// A successfully resolved mention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFood {
    /// Mention as given
    pub mention: String,
    /// Foods in mention order, already scaled to the stated quantity
    pub items: Vec<FoodFact>,
    /// Tier that produced the items
    pub source: FactSource,
    /// Confidence of the weakest item
    pub confidence: Confidence,
    /// Allergy and restriction conflicts
    pub warnings: Vec<SafetyWarning>,
    /// Set when the figures are an AI estimate
    pub disclaimer: bool,
    /// How the food was captured
    #[serde(skip)]
    pub origin: MealOrigin,
}

impl ResolvedFood {
    fn new(mention: &str, items: Vec<FoodFact>, source: FactSource, origin: MealOrigin) -> Self {
        let confidence = items
            .iter()
            .map(FoodFact::confidence)
            .min()
            .unwrap_or_else(|| source.confidence());
        Self {
            mention: mention.to_owned(),
            items,
            source,
            confidence,
            warnings: Vec::new(),
            disclaimer: source == FactSource::AiEstimate,
            origin,
        }
    }

    /// Summed macros over all items
    #[must_use]
    pub fn totals(&self) -> Macros {
        self.items.iter().map(FoodFact::macros).sum()
    }

    /// Whether any safety warning is attached
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Draft a meal eaten now from this resolution
    #[must_use]
    pub fn into_draft(self) -> MealDraft {
        MealDraft::now(self.mention, self.items, self.origin)
    }
}

/// Why one tier did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    /// Tier that was tried
    pub tier: FactSource,
    /// What happened
    pub reason: String,
}

/// Every tier failed for a mention
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReport {
    /// Mention as given
    pub mention: String,
    /// Tiers in the order they were tried
    pub attempts: Vec<TierAttempt>,
}

/// Outcome of resolving a mention
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Nutrition determined
    Resolved(ResolvedFood),
    /// Could not determine nutrition
    Unresolved(UnresolvedReport),
}

impl Resolution {
    /// The resolved food, if any
    #[must_use]
    pub const fn resolved(&self) -> Option<&ResolvedFood> {
        match self {
            Self::Resolved(food) => Some(food),
            Self::Unresolved(_) => None,
        }
    }

    /// Whether nutrition was determined
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Orchestrates the resolution ladder
#[derive(Clone)]
pub struct NutritionResolver {
    catalog: &'static FoodCatalog,
    source: Option<Arc<dyn NutritionSource>>,
    estimator: Option<Arc<dyn EstimationAdapter>>,
    matching: ResolverConfig,
    resilience: ResilienceConfig,
}

impl NutritionResolver {
    /// Resolver over the built-in catalog with no external tiers
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            catalog: FoodCatalog::builtin(),
            source: None,
            estimator: None,
            matching: config.resolver.clone(),
            resilience: config.resilience.clone(),
        }
    }

    /// Use a different catalog
    #[must_use]
    pub const fn with_catalog(mut self, catalog: &'static FoodCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Add the external database tier
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn NutritionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Add the AI estimation tier
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn EstimationAdapter>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Resolve a mention against the ladder and cross-check it with the profile
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty mention. Tier failures, including a
    /// mention whose quantity cannot be used for lookup, are reported in the
    /// result rather than as errors.
    pub async fn resolve(
        &self,
        mention: &FoodMention,
        profile: &UserProfile,
    ) -> AppResult<Resolution> {
        let description = mention.describe().to_owned();
        let mut attempts = Vec::new();

        let resolved = match mention {
            FoodMention::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::invalid_input("food mention is empty"));
                }
                self.resolve_text(text, &mut attempts).await?
            }
            FoodMention::Image { image, caption } => {
                let input = EstimationInput::Image {
                    image,
                    caption: caption.as_deref(),
                };
                self.estimate(&description, input, MealOrigin::ImageAnalysis, &mut attempts)
                    .await
            }
        };

        Ok(match resolved {
            Some(mut food) => {
                food.warnings = Self::safety_warnings(&food.items, profile);
                let calories = food.totals().calories;
                EngineLogger::log_resolution(&description, food.source, food.items.len(), calories);
                Resolution::Resolved(food)
            }
            None => {
                EngineLogger::log_unresolved(&description, attempts.len());
                Resolution::Unresolved(UnresolvedReport {
                    mention: description,
                    attempts,
                })
            }
        })
    }

    async fn resolve_text(
        &self,
        text: &str,
        attempts: &mut Vec<TierAttempt>,
    ) -> AppResult<Option<ResolvedFood>> {
        match parse_mention(text, self.matching.max_quantity) {
            Ok(parsed) => {
                EngineLogger::log_tier_attempt(text, FactSource::LocalCatalog);
                if let Some(items) = self.from_catalog(text, &parsed)? {
                    return Ok(Some(ResolvedFood::new(
                        text,
                        items,
                        FactSource::LocalCatalog,
                        MealOrigin::ManualText,
                    )));
                }
                Self::record(attempts, text, FactSource::LocalCatalog, "no catalog match", false);

                if let Some(food) = self.from_source(text, &parsed, attempts).await {
                    return Ok(Some(food));
                }
            }
            Err(error) => {
                // Database tiers need a name and amount; the model reads the raw text
                let reason = format!("mention not usable for lookup: {error}");
                Self::record(attempts, text, FactSource::LocalCatalog, &reason, false);
                Self::record(attempts, text, FactSource::ExternalApi, &reason, false);
            }
        }

        Ok(self
            .estimate(text, EstimationInput::Text(text), MealOrigin::ManualText, attempts)
            .await)
    }

    // ------------------------------------------------------------------------
    // Tier 1: local catalog
    // ------------------------------------------------------------------------

    fn from_catalog(&self, text: &str, parsed: &ParsedMention) -> AppResult<Option<Vec<FoodFact>>> {
        if let Some(found) = self.catalog.lookup(&parsed.name, &self.matching) {
            return self.expand(found.entry, parsed).map(Some);
        }

        // "eggs and toast": use the parts only if every one of them matches
        let parts = split_conjunctions(text);
        if parts.len() < 2 {
            return Ok(None);
        }
        let mut items = Vec::new();
        for part in &parts {
            let Ok(part_mention) = parse_mention(part, self.matching.max_quantity) else {
                return Ok(None);
            };
            let Some(found) = self.catalog.lookup(&part_mention.name, &self.matching) else {
                return Ok(None);
            };
            items.extend(self.expand(found.entry, &part_mention)?);
        }
        Ok(Some(items))
    }

    /// Facts for an entry at the parsed amount, split into components when it is a composite
    fn expand(&self, entry: &CatalogEntry, parsed: &ParsedMention) -> AppResult<Vec<FoodFact>> {
        let multiplier = parsed.amount.multiplier(entry.serving_grams);
        let parts = self
            .catalog
            .components(entry)
            .unwrap_or_else(|| vec![(entry.facts(), 1.0)]);
        parts
            .into_iter()
            .map(|(facts, servings)| -> AppResult<FoodFact> {
                let fact = FoodFact::new(facts, FactSource::LocalCatalog)?;
                Ok(fact.scaled(servings * multiplier)?)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Tier 2: external nutrition database
    // ------------------------------------------------------------------------

    async fn from_source(
        &self,
        text: &str,
        parsed: &ParsedMention,
        attempts: &mut Vec<TierAttempt>,
    ) -> Option<ResolvedFood> {
        let Some(source) = &self.source else {
            let reason = "no external source configured";
            Self::record(attempts, text, FactSource::ExternalApi, reason, false);
            return None;
        };

        EngineLogger::log_tier_attempt(text, FactSource::ExternalApi);
        let name = parsed.name.as_str();
        let result = call_with_retry(
            source.name(),
            &self.resilience,
            || SourceError::unavailable(source.name(), "request timed out"),
            || source.query(name),
        )
        .await
        .and_then(|facts| {
            if facts.is_empty() {
                Err(SourceError::not_found(source.name(), name))
            } else {
                Ok(facts)
            }
        });

        let facts = match result {
            Ok(facts) => facts,
            Err(error) => {
                let degraded = error.is_transient();
                Self::record(attempts, text, FactSource::ExternalApi, &error.to_string(), degraded);
                return None;
            }
        };

        let multiplier = parsed.amount.multiplier(facts.serving_grams);
        let components = call_with_retry(
            source.name(),
            &self.resilience,
            || SourceError::unavailable(source.name(), "component request timed out"),
            || source.query_components(name),
        )
        .await;
        let parts = match components {
            Ok(Some(parts)) if !parts.is_empty() => parts,
            Ok(_) => vec![facts],
            Err(error) => {
                debug!(
                    mention = %text,
                    error = %error,
                    "No component breakdown, keeping item whole"
                );
                vec![facts]
            }
        };
        let items: Result<Vec<FoodFact>, _> = parts
            .into_iter()
            .map(|facts| FoodFact::new(facts, FactSource::ExternalApi)?.scaled(multiplier))
            .collect();

        match items {
            Ok(items) => Some(ResolvedFood::new(
                text,
                items,
                FactSource::ExternalApi,
                MealOrigin::ManualText,
            )),
            Err(error) => {
                let reason = format!("invalid data from {}: {error}", source.name());
                Self::record(attempts, text, FactSource::ExternalApi, &reason, true);
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Tier 3: AI estimate
    // ------------------------------------------------------------------------

    async fn estimate(
        &self,
        description: &str,
        input: EstimationInput<'_>,
        origin: MealOrigin,
        attempts: &mut Vec<TierAttempt>,
    ) -> Option<ResolvedFood> {
        let Some(estimator) = &self.estimator else {
            let reason = "no estimation model configured";
            Self::record(attempts, description, FactSource::AiEstimate, reason, false);
            return None;
        };

        EngineLogger::log_tier_attempt(description, FactSource::AiEstimate);
        let result = call_with_retry(
            estimator.name(),
            &self.resilience,
            || EstimationError::model_unavailable("request timed out"),
            || estimator.estimate(input),
        )
        .await
        .and_then(|facts| {
            if facts.is_empty() {
                return Err(EstimationError::model_unavailable("estimate was empty"));
            }
            FoodFact::new(facts, FactSource::AiEstimate)
                .map_err(|e| EstimationError::model_unavailable(format!("invalid estimate: {e}")))
        });

        match result {
            Ok(fact) => Some(ResolvedFood::new(
                description,
                vec![fact],
                FactSource::AiEstimate,
                origin,
            )),
            Err(error) => {
                let degraded = error.is_transient();
                let reason = error.to_string();
                Self::record(attempts, description, FactSource::AiEstimate, &reason, degraded);
                None
            }
        }
    }

    fn record(
        attempts: &mut Vec<TierAttempt>,
        mention: &str,
        tier: FactSource,
        reason: &str,
        degraded: bool,
    ) {
        EngineLogger::log_fallback(mention, tier, reason, degraded);
        attempts.push(TierAttempt {
            tier,
            reason: reason.to_owned(),
        });
    }

    fn safety_warnings(items: &[FoodFact], profile: &UserProfile) -> Vec<SafetyWarning> {
        items
            .iter()
            .flat_map(|item| safety::check_food(item.name(), item.ingredients(), profile))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
