// ABOUTME: USDA FoodData Central API client used as the external nutrition source
// ABOUTME: Food search, detail retrieval, canonical unit mapping, caching, and rate limiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! USDA `FoodData` Central API Client
//!
//! Looks a food up by name (search, then details of the best hit) and maps
//! the nutrient list to canonical units for one serving.
//!
//! # Features
//! - 24-hour caching of successful lookups
//! - Client-side rate limiting that reports `RateLimited` instead of waiting
//! - HTTP status mapping: 404 to `NotFound`, 429 to `RateLimited`, others to `Unavailable`
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aafiya_core::errors::SourceError;
use aafiya_core::models::{Macros, NutritionFacts};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::units;
use super::NutritionSource;

const SOURCE_NAME: &str = "USDA FoodData Central";

/// USDA nutrient ids
const NUTRIENT_PROTEIN: u32 = 1003;
const NUTRIENT_FAT: u32 = 1004;
const NUTRIENT_CARBS: u32 = 1005;
const NUTRIENT_ENERGY: u32 = 1008;
const NUTRIENT_ENERGY_KJ: u32 = 1062;
/// Atwater general factors, reported for Foundation foods
const NUTRIENT_ENERGY_ATWATER_GENERAL: u32 = 2047;
/// Atwater specific factors, reported for Foundation foods
const NUTRIENT_ENERGY_ATWATER_SPECIFIC: u32 = 2048;
const NUTRIENT_FIBER: u32 = 1079;
const NUTRIENT_SUGAR: u32 = 2000;
const NUTRIENT_SODIUM: u32 = 1093;

/// USDA API client configuration
#[derive(Debug, Clone)]
pub struct UsdaClientConfig {
    /// USDA API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL for USDA API (default: <https://api.nal.usda.gov/fdc/v1>)
    pub base_url: String,
    /// Cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Rate limit per minute (default: 30)
    pub rate_limit_per_minute: u32,
    /// Search results considered when picking a match
    pub search_page_size: u32,
    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.nal.usda.gov/fdc/v1".into(),
            cache_ttl_secs: 86400,
            rate_limit_per_minute: 30,
            search_page_size: 5,
            request_timeout_secs: 30,
        }
    }
}

impl UsdaClientConfig {
    /// Read `USDA_API_KEY` (required) and `USDA_BASE_URL` (optional)
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("USDA_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(base_url) = env::var("USDA_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }
}

/// USDA Food Search Result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodSearchResult {
    /// `FoodData` Central ID
    #[serde(rename = "fdcId")]
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Data type (e.g., "Survey (FNDDS)", "Foundation", "SR Legacy")
    #[serde(rename = "dataType", default)]
    pub data_type: String,
}

/// USDA Food Nutrient in source units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodNutrient {
    /// Nutrient ID
    pub nutrient_id: u32,
    /// Nutrient unit (e.g., "g", "kcal", "mg")
    pub unit_name: String,
    /// Amount per 100g
    pub amount: f64,
}

/// Detailed USDA Food Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodDetails {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Nutrients per 100 g
    pub food_nutrients: Vec<FoodNutrient>,
    /// Portion size
    pub serving_size: Option<f64>,
    /// Portion size unit
    pub serving_size_unit: Option<String>,
}

impl FoodDetails {
    fn nutrient(&self, id: u32) -> Option<&FoodNutrient> {
        self.food_nutrients.iter().find(|n| n.nutrient_id == id)
    }

    fn grams_per_100g(&self, id: u32) -> Option<f64> {
        self.nutrient(id)
            .and_then(|n| units::mass_to_grams(n.amount, &n.unit_name))
    }

    fn kcal_per_100g(&self) -> Option<f64> {
        [
            NUTRIENT_ENERGY,
            NUTRIENT_ENERGY_ATWATER_GENERAL,
            NUTRIENT_ENERGY_ATWATER_SPECIFIC,
            NUTRIENT_ENERGY_KJ,
        ]
            .into_iter()
            .filter_map(|id| self.nutrient(id))
            .find_map(|n| units::energy_to_kcal(n.amount, &n.unit_name))
    }

    /// Serving size in grams, defaulting to the 100 g reference
    #[must_use]
    pub fn serving_grams(&self) -> f64 {
        match (self.serving_size, self.serving_size_unit.as_deref()) {
            (Some(size), Some(unit)) if size > 0.0 => {
                units::mass_to_grams(size, unit).unwrap_or(units::REFERENCE_GRAMS)
            }
            (Some(size), None) if size > 0.0 => size,
            _ => units::REFERENCE_GRAMS,
        }
    }

    /// Nutrition for one serving in canonical units
    ///
    /// `None` when the record reports no energy value at all, so a missing
    /// figure is never turned into zero calories.
    #[must_use]
    pub fn to_facts(&self) -> Option<NutritionFacts> {
        let kcal_per_100g = self.kcal_per_100g()?;
        let serving = self.serving_grams();
        let rescale = |per_100g: f64| units::per_100g_to_serving(per_100g, serving);
        let macros = Macros::new(
            rescale(kcal_per_100g),
            rescale(self.grams_per_100g(NUTRIENT_PROTEIN).unwrap_or(0.0)),
            rescale(self.grams_per_100g(NUTRIENT_CARBS).unwrap_or(0.0)),
            rescale(self.grams_per_100g(NUTRIENT_FAT).unwrap_or(0.0)),
        );
        let sodium_mg = self
            .nutrient(NUTRIENT_SODIUM)
            .and_then(|n| units::mass_to_milligrams(n.amount, &n.unit_name))
            .map(rescale);

        Some(NutritionFacts {
            name: self.description.to_lowercase(),
            serving_grams: serving,
            macros,
            fiber_g: self.grams_per_100g(NUTRIENT_FIBER).map(rescale),
            sugar_g: self.grams_per_100g(NUTRIENT_SUGAR).map(rescale),
            sodium_mg,
            ingredients: Vec::new(),
        })
    }
}

/// USDA API search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodSearchResult>,
}

/// USDA API food details response
#[derive(Debug, Deserialize)]
struct FoodDetailsResponse {
    #[serde(rename = "fdcId")]
    fdc_id: u64,
    description: String,
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<FoodNutrientResponse>,
    #[serde(rename = "servingSize")]
    serving_size: Option<f64>,
    #[serde(rename = "servingSizeUnit")]
    serving_size_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FoodNutrientResponse {
    nutrient: Option<NutrientInfo>,
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NutrientInfo {
    id: u32,
    #[serde(rename = "unitName")]
    unit_name: String,
}

impl From<FoodDetailsResponse> for FoodDetails {
    fn from(response: FoodDetailsResponse) -> Self {
        let food_nutrients = response
            .food_nutrients
            .into_iter()
            .filter_map(|n| {
                let nutrient = n.nutrient?;
                Some(FoodNutrient {
                    nutrient_id: nutrient.id,
                    unit_name: nutrient.unit_name,
                    amount: n.amount?,
                })
            })
            .collect();
        Self {
            fdc_id: response.fdc_id,
            description: response.description,
            food_nutrients,
            serving_size: response.serving_size,
            serving_size_unit: response.serving_size_unit,
        }
    }
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Sliding-window request budget
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    const fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: Vec::new(),
            limit,
            window,
        }
    }

    /// Record a request, or return seconds until the oldest one leaves the window
    fn try_acquire(&mut self) -> Result<(), u64> {
        let now = Instant::now();
        self.requests
            .retain(|&t| now.duration_since(t) < self.window);
        if self.requests.len() < self.limit as usize {
            self.requests.push(now);
            return Ok(());
        }
        let oldest = self.requests.first().copied().unwrap_or(now);
        let wait = self.window.saturating_sub(now.duration_since(oldest));
        Err(wait.as_secs().max(1))
    }
}

/// USDA `FoodData` Central API Client
pub struct UsdaClient {
    config: UsdaClientConfig,
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CacheEntry<FoodDetails>>>>,
    rate_limiter: Arc<RwLock<RateLimiter>>,
}

impl UsdaClient {
    /// Create a new USDA API client
    #[must_use]
    pub fn new(config: UsdaClientConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60));
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            rate_limiter: Arc::new(RwLock::new(rate_limiter)),
        }
    }

    /// Client configured from `USDA_API_KEY`, if set
    #[must_use]
    pub fn from_env() -> Option<Self> {
        UsdaClientConfig::from_env().map(Self::new)
    }

    async fn acquire(&self) -> Result<(), SourceError> {
        self.rate_limiter
            .write()
            .await
            .try_acquire()
            .map_err(|secs| SourceError::rate_limited(SOURCE_NAME, Some(secs)))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        item: &str,
    ) -> Result<T, SourceError> {
        self.acquire().await?;
        let response = self
            .http_client
            .get(url)
            .query(query)
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, &response, item));
        }
        response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("JSON parse error: {e}")))
    }

    /// Search for foods by query string
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the request fails or the rate limit is exceeded
    pub async fn search_foods(&self, query: &str) -> Result<Vec<FoodSearchResult>, SourceError> {
        let url = format!("{}/foods/search", self.config.base_url);
        let page_size = self.config.search_page_size.clamp(1, 200).to_string();
        let response: SearchResponse = self
            .get_json(&url, &[("query", query), ("pageSize", &page_size)], query)
            .await?;
        Ok(response.foods)
    }

    /// Get detailed information for a specific food by FDC ID
    ///
    /// # Errors
    ///
    /// Returns `SourceError` if the request fails or the food does not exist
    pub async fn get_food_details(&self, fdc_id: u64) -> Result<FoodDetails, SourceError> {
        let url = format!("{}/food/{fdc_id}", self.config.base_url);
        let response: FoodDetailsResponse =
            self.get_json(&url, &[], &fdc_id.to_string()).await?;
        Ok(response.into())
    }

    async fn cached(&self, key: &str) -> Option<FoodDetails> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    async fn store(&self, key: String, details: FoodDetails) {
        let expires_at = Instant::now() + Duration::from_secs(self.config.cache_ttl_secs);
        self.cache.write().await.insert(
            key,
            CacheEntry {
                data: details,
                expires_at,
            },
        );
    }

    /// Clear the lookup cache
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

fn map_status(status: StatusCode, response: &reqwest::Response, item: &str) -> SourceError {
    match status {
        StatusCode::NOT_FOUND => SourceError::not_found(SOURCE_NAME, item),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            SourceError::rate_limited(SOURCE_NAME, retry_after)
        }
        other => SourceError::unavailable(SOURCE_NAME, format!("HTTP {other}")),
    }
}

#[async_trait]
impl NutritionSource for UsdaClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn query(&self, normalized_name: &str) -> Result<NutritionFacts, SourceError> {
        if let Some(details) = self.cached(normalized_name).await {
            debug!(food = %normalized_name, "USDA cache hit");
            return details
                .to_facts()
                .ok_or_else(|| SourceError::not_found(SOURCE_NAME, normalized_name));
        }

        let best = self
            .search_foods(normalized_name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::not_found(SOURCE_NAME, normalized_name))?;
        let details = self.get_food_details(best.fdc_id).await?;
        let facts = details
            .to_facts()
            .filter(|facts| !facts.is_empty())
            .ok_or_else(|| SourceError::not_found(SOURCE_NAME, normalized_name))?;

        self.store(normalized_name.to_owned(), details).await;
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nutrient(nutrient_id: u32, unit: &str, amount: f64) -> FoodNutrient {
        FoodNutrient {
            nutrient_id,
            unit_name: unit.into(),
            amount,
        }
    }

    #[test]
    fn test_details_rescaled_to_serving() {
        let details = FoodDetails {
            fdc_id: 171_688,
            description: "Apples, raw, with skin".into(),
            food_nutrients: vec![
                nutrient(NUTRIENT_PROTEIN, "G", 0.26),
                nutrient(NUTRIENT_FAT, "G", 0.17),
                nutrient(NUTRIENT_CARBS, "G", 13.81),
                nutrient(NUTRIENT_ENERGY, "KCAL", 52.0),
                nutrient(NUTRIENT_SODIUM, "MG", 1.0),
            ],
            serving_size: Some(182.0),
            serving_size_unit: Some("g".into()),
        };
        let facts = details.to_facts().unwrap();
        assert!((facts.macros.calories - 94.64).abs() < 1e-6);
        assert!((facts.serving_grams - 182.0).abs() < f64::EPSILON);
        assert!((facts.sodium_mg.unwrap() - 1.82).abs() < 1e-6);
        assert!(facts.fiber_g.is_none());
    }

    #[test]
    fn test_foundation_food_energy_ids() {
        let details = FoodDetails {
            fdc_id: 2_346_386,
            description: "Oats, whole grain, rolled".into(),
            food_nutrients: vec![
                nutrient(NUTRIENT_PROTEIN, "G", 13.5),
                nutrient(NUTRIENT_CARBS, "G", 68.7),
                nutrient(NUTRIENT_ENERGY_ATWATER_GENERAL, "KCAL", 382.0),
                nutrient(NUTRIENT_ENERGY_ATWATER_SPECIFIC, "KCAL", 375.0),
            ],
            serving_size: None,
            serving_size_unit: None,
        };
        let facts = details.to_facts().unwrap();
        assert!((facts.macros.calories - 382.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_energy_is_not_zero_calories() {
        let details = FoodDetails {
            fdc_id: 3,
            description: "Mystery grain".into(),
            food_nutrients: vec![
                nutrient(NUTRIENT_PROTEIN, "G", 12.0),
                nutrient(NUTRIENT_CARBS, "G", 60.0),
            ],
            serving_size: None,
            serving_size_unit: None,
        };
        assert!(details.to_facts().is_none());
    }

    #[test]
    fn test_kilojoules_and_missing_serving() {
        let details = FoodDetails {
            fdc_id: 1,
            description: "Quinoa tabbouleh".into(),
            food_nutrients: vec![nutrient(NUTRIENT_ENERGY_KJ, "kJ", 418.4)],
            serving_size: None,
            serving_size_unit: None,
        };
        let facts = details.to_facts().unwrap();
        assert!((facts.macros.calories - 100.0).abs() < 1e-9);
        assert!((facts.serving_grams - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_all_zero_details_are_empty() {
        let details = FoodDetails {
            fdc_id: 2,
            description: "Water".into(),
            food_nutrients: vec![nutrient(NUTRIENT_ENERGY, "KCAL", 0.0)],
            serving_size: Some(8.0),
            serving_size_unit: Some("oz".into()),
        };
        let facts = details.to_facts().unwrap();
        assert!(facts.is_empty());
        assert!((facts.serving_grams - 226.8).abs() < 1e-9);
    }

    #[test]
    fn test_rate_limiter_reports_wait() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.try_acquire().is_ok());
        let wait = limiter.try_acquire().unwrap_err();
        assert!((1..=60).contains(&wait));
    }
}
