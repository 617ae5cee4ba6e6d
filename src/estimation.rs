// ABOUTME: AI estimation tier for foods no structured source can resolve
// ABOUTME: Asks an LLM for a JSON estimate, falling back to prose figures it never invents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Nutrition estimation through a generative model.
//!
//! The estimator requests a JSON object. Models do not always comply, so a
//! prose answer is scanned for calorie and macro figures. A missing calorie
//! figure fails the tier; missing macros are reported as zero only when a
//! calorie figure was found.

use std::sync::{Arc, LazyLock};

use aafiya_core::errors::{AppError, ErrorCode, EstimationError};
use aafiya_core::models::{Macros, NutritionFacts};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::external::units::REFERENCE_GRAMS;
use crate::llm::{ChatMessage, ChatRequest, ImageInput, LlmProvider};

/// What to estimate
#[derive(Debug, Clone, Copy)]
pub enum EstimationInput<'a> {
    /// Free-text meal description
    Text(&'a str),
    /// Meal photo with an optional caption
    Image {
        /// The photo
        image: &'a ImageInput,
        /// User-supplied caption
        caption: Option<&'a str>,
    },
}

/// Capability for approximating nutrition with a generative model
#[async_trait]
pub trait EstimationAdapter: Send + Sync {
    /// Adapter name used in logs
    fn name(&self) -> &str;

    /// Approximate nutrition for the whole input
    ///
    /// # Errors
    ///
    /// `ModelUnavailable` when the model cannot be reached or gives no usable
    /// figures, `InvalidInput` when the input cannot be estimated at all
    async fn estimate(&self, input: EstimationInput<'_>) -> Result<NutritionFacts, EstimationError>;
}

const ESTIMATION_PROMPT: &str = "You are a nutrition analyst. Estimate the nutrition of the \
food described or shown. Reply with a single JSON object and nothing else, using the keys \
\"name\" (short food name), \"serving_grams\", \"calories\" (kcal), \"protein_g\", \
\"carbs_g\", \"fat_g\" and \"ingredients\" (array of main ingredients). Give totals for the \
whole portion described.";

/// Low temperature keeps estimates stable between calls
const ESTIMATION_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct EstimateReply {
    name: Option<String>,
    serving_grams: Option<f64>,
    calories: f64,
    #[serde(default)]
    protein_g: f64,
    #[serde(default)]
    carbs_g: f64,
    #[serde(default)]
    fat_g: f64,
    #[serde(default)]
    ingredients: Vec<String>,
}

static CALORIES_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: ~450 kcal, 300 calories, calories: 520
    Regex::new(
        r"(?i)~?(\d+(?:\.\d+)?)[ \t]*(?:kcal|cal(?:orie)?s?)\b|calories[: \t]+~?(\d+(?:\.\d+)?)",
    )
    .ok()
});

static PROTEIN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: 25g protein, protein: 25
    Regex::new(
        r"(?i)~?(\d+(?:\.\d+)?)[ \t]*g?[ \t]*(?:protein|pro)\b|protein[: \t]+~?(\d+(?:\.\d+)?)",
    )
    .ok()
});

static CARBS_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)~?(\d+(?:\.\d+)?)[ \t]*g?[ \t]*carb(?:ohydrate)?s?\b|carbs?[: \t]+~?(\d+(?:\.\d+)?)",
    )
    .ok()
});

static FAT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)~?(\d+(?:\.\d+)?)[ \t]*g?[ \t]*fats?\b|fat[: \t]+~?(\d+(?:\.\d+)?)").ok()
});

fn first_figure(pattern: &LazyLock<Option<Regex>>, text: &str) -> Option<f64> {
    let captures = pattern.as_ref()?.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pull the first JSON object out of a reply that may wrap it in prose or fences
fn json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Parse a model reply into facts named `fallback_name` unless the reply names the food
///
/// # Errors
///
/// Returns `ModelUnavailable` when the reply has no calorie figure
pub fn parse_estimate(reply: &str, fallback_name: &str) -> Result<NutritionFacts, EstimationError> {
    let parsed = json_object(reply)
        .and_then(|json| serde_json::from_str::<EstimateReply>(json).ok());
    if let Some(parsed) = parsed {
        let name = parsed
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| fallback_name.to_owned());
        let serving = parsed
            .serving_grams
            .filter(|g| *g > 0.0)
            .unwrap_or(REFERENCE_GRAMS);
        let macros = Macros::new(parsed.calories, parsed.protein_g, parsed.carbs_g, parsed.fat_g);
        return Ok(NutritionFacts::new(name, serving, macros).with_ingredients(parsed.ingredients));
    }

    debug!("estimate reply was not JSON, scanning prose");
    let calories = first_figure(&CALORIES_PATTERN, reply)
        .ok_or_else(|| EstimationError::model_unavailable("reply contained no calorie figure"))?;
    let macros = Macros::new(
        calories,
        first_figure(&PROTEIN_PATTERN, reply).unwrap_or(0.0),
        first_figure(&CARBS_PATTERN, reply).unwrap_or(0.0),
        first_figure(&FAT_PATTERN, reply).unwrap_or(0.0),
    );
    Ok(NutritionFacts::new(fallback_name, REFERENCE_GRAMS, macros))
}

fn map_provider_error(error: &AppError) -> EstimationError {
    match error.code {
        ErrorCode::InvalidInput => EstimationError::invalid_input(error.message.clone()),
        _ => EstimationError::model_unavailable(error.to_string()),
    }
}

/// Estimation adapter backed by any [`LlmProvider`]
#[derive(Clone)]
pub struct LlmEstimator {
    provider: Arc<dyn LlmProvider>,
}

impl LlmEstimator {
    /// Wrap a provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn build_request(
        &self,
        input: EstimationInput<'_>,
    ) -> Result<(ChatRequest, String), EstimationError> {
        let (message, fallback_name) = match input {
            EstimationInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(EstimationError::invalid_input("empty food description"));
                }
                (ChatMessage::user(text), text.to_lowercase())
            }
            EstimationInput::Image { image, caption } => {
                if !self.provider.capabilities().supports_vision() {
                    return Err(EstimationError::invalid_input(format!(
                        "{} cannot analyze images",
                        self.provider.display_name()
                    )));
                }
                if image.bytes.is_empty() {
                    return Err(EstimationError::invalid_input("empty image"));
                }
                let caption = caption.map(str::trim).filter(|c| !c.is_empty());
                let prompt = caption.map_or_else(
                    || "Identify the meal in this photo.".to_owned(),
                    |c| format!("Identify the meal in this photo. The user says: {c}"),
                );
                let name =
                    caption.map_or_else(|| "photographed meal".to_owned(), str::to_lowercase);
                (ChatMessage::user(prompt).with_image(image.clone()), name)
            }
        };

        let mut request = ChatRequest::new(vec![ChatMessage::system(ESTIMATION_PROMPT), message])
            .with_temperature(ESTIMATION_TEMPERATURE);
        if self.provider.capabilities().supports_json_mode() {
            request = request.with_json_mode();
        }
        Ok((request, fallback_name))
    }
}

#[async_trait]
impl EstimationAdapter for LlmEstimator {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn estimate(
        &self,
        input: EstimationInput<'_>,
    ) -> Result<NutritionFacts, EstimationError> {
        let (request, fallback_name) = self.build_request(input)?;
        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| map_provider_error(&e))?;
        parse_estimate(&response.content, &fallback_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json() {
        let reply = "```json\n{\"name\": \"quinoa tabbouleh\", \"serving_grams\": 250, \
                     \"calories\": 320, \"protein_g\": 9, \"carbs_g\": 45, \"fat_g\": 12, \
                     \"ingredients\": [\"Quinoa\", \"Parsley\"]}\n```";
        let facts = parse_estimate(reply, "bowl").unwrap();
        assert_eq!(facts.name, "quinoa tabbouleh");
        assert!((facts.macros.calories - 320.0).abs() < f64::EPSILON);
        assert_eq!(facts.ingredients, vec!["quinoa", "parsley"]);
    }

    #[test]
    fn test_parse_prose_fallback() {
        let reply = "That looks like roughly ~450 kcal, with 30g protein, 40g carbs and 18g fat.";
        let facts = parse_estimate(reply, "curry").unwrap();
        assert_eq!(facts.name, "curry");
        assert!((facts.macros.calories - 450.0).abs() < f64::EPSILON);
        assert!((facts.macros.protein_g - 30.0).abs() < f64::EPSILON);
        assert!((facts.macros.carbs_g - 40.0).abs() < f64::EPSILON);
        assert!((facts.macros.fat_g - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_labelled_prose() {
        let facts =
            parse_estimate("Calories: 520\nProtein: 22\nCarbs: 60\nFat: 19", "plate").unwrap();
        assert!((facts.macros.calories - 520.0).abs() < f64::EPSILON);
        assert!((facts.macros.fat_g - 19.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_calorie_figure_fails() {
        let result = parse_estimate("I can't tell what this is, sorry.", "mystery");
        assert!(matches!(result, Err(EstimationError::ModelUnavailable { .. })));
    }
}
