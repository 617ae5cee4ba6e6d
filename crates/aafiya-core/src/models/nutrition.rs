// ABOUTME: Nutrition fact models shared by the catalog, adapters, and resolver
// ABOUTME: Macros, source-tagged FoodFact with derived confidence, and untagged adapter facts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::errors::NutritionDataError;

/// Where a nutrition record came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    /// Built-in reference table
    LocalCatalog,
    /// External nutrition database
    ExternalApi,
    /// Generative model estimate
    AiEstimate,
}

impl FactSource {
    /// Confidence tier implied by this source
    #[must_use]
    pub const fn confidence(self) -> Confidence {
        match self {
            Self::LocalCatalog => Confidence::High,
            Self::ExternalApi => Confidence::Medium,
            Self::AiEstimate => Confidence::Low,
        }
    }
}

impl fmt::Display for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LocalCatalog => "local catalog",
            Self::ExternalApi => "external database",
            Self::AiEstimate => "AI estimate",
        };
        f.write_str(label)
    }
}

/// How trustworthy a nutrition record is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Lowest tier, AI estimates only
    Low,
    /// Structured external data
    Medium,
    /// Curated local data
    High,
}

/// Energy and macronutrients in canonical units (kcal, grams)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Macros {
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein_g: f64,
    /// Carbohydrates in grams
    pub carbs_g: f64,
    /// Fat in grams
    pub fat_g: f64,
}

impl Macros {
    /// All-zero totals
    pub const ZERO: Self = Self {
        calories: 0.0,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
    };

    /// Create macros from raw values
    #[must_use]
    pub const fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            calories,
            protein_g,
            carbs_g,
            fat_g,
        }
    }

    /// Multiply every value by `factor`
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    /// True when every value is zero, which adapters treat as "no data"
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.calories == 0.0 && self.protein_g == 0.0 && self.carbs_g == 0.0 && self.fat_g == 0.0
    }

    /// Reject negative and non-finite values
    ///
    /// # Errors
    ///
    /// Returns `NutritionDataError::InvalidNutrient` naming the first bad field
    pub fn validate(&self) -> Result<(), NutritionDataError> {
        check_nutrient("calories", self.calories)?;
        check_nutrient("protein_g", self.protein_g)?;
        check_nutrient("carbs_g", self.carbs_g)?;
        check_nutrient("fat_g", self.fat_g)
    }
}

impl Add for Macros {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Macros {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

pub(crate) fn check_nutrient(field: &'static str, value: f64) -> Result<(), NutritionDataError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NutritionDataError::InvalidNutrient { field, value })
    }
}

fn check_optional(field: &'static str, value: Option<f64>) -> Result<(), NutritionDataError> {
    value.map_or(Ok(()), |v| check_nutrient(field, v))
}

/// Nutrition values as reported by a data source, before provenance is attached
///
/// Adapters return this type; only the resolver decides the `FactSource`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionFacts {
    /// Food name as reported by the source
    pub name: String,
    /// Serving size in grams
    pub serving_grams: f64,
    /// Macros for one serving
    pub macros: Macros,
    /// Fiber in grams, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    /// Sugar in grams, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    /// Sodium in milligrams, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
    /// Known ingredients (lowercase), empty when unknown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

impl NutritionFacts {
    /// Facts with only the core macros populated
    pub fn new(name: impl Into<String>, serving_grams: f64, macros: Macros) -> Self {
        Self {
            name: name.into(),
            serving_grams,
            macros,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            ingredients: Vec::new(),
        }
    }

    /// Attach known ingredients
    #[must_use]
    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients
            .into_iter()
            .map(|i| i.into().to_lowercase())
            .collect();
        self
    }

    /// An all-zero record carries no information
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_zero()
            && self.fiber_g.unwrap_or(0.0) == 0.0
            && self.sugar_g.unwrap_or(0.0) == 0.0
    }
}

/// Normalized nutrition record for one food item and serving, tagged with provenance
///
/// Invariants enforced at construction and on deserialization: every nutrient
/// is finite and non-negative, serving size is positive, and `confidence` is
/// always the tier implied by `source` (an AI estimate is never `High`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "FoodFactRecord")]
pub struct FoodFact {
    name: String,
    serving_grams: f64,
    #[serde(flatten)]
    macros: Macros,
    #[serde(skip_serializing_if = "Option::is_none")]
    fiber_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sugar_g: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sodium_mg: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ingredients: Vec<String>,
    source: FactSource,
    confidence: Confidence,
}

impl FoodFact {
    /// Tag source facts with their provenance
    ///
    /// # Errors
    ///
    /// Returns `NutritionDataError` when a value is negative or non-finite,
    /// the serving is not positive, or the name is blank
    pub fn new(facts: NutritionFacts, source: FactSource) -> Result<Self, NutritionDataError> {
        let name = facts.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(NutritionDataError::EmptyName);
        }
        if !(facts.serving_grams.is_finite() && facts.serving_grams > 0.0) {
            return Err(NutritionDataError::InvalidServing(facts.serving_grams));
        }
        facts.macros.validate()?;
        check_optional("fiber_g", facts.fiber_g)?;
        check_optional("sugar_g", facts.sugar_g)?;
        check_optional("sodium_mg", facts.sodium_mg)?;

        Ok(Self {
            name,
            serving_grams: facts.serving_grams,
            macros: facts.macros,
            fiber_g: facts.fiber_g,
            sugar_g: facts.sugar_g,
            sodium_mg: facts.sodium_mg,
            ingredients: facts.ingredients,
            source,
            confidence: source.confidence(),
        })
    }

    /// Scale the serving by a positive quantity multiplier
    ///
    /// # Errors
    ///
    /// Returns `NutritionDataError::InvalidQuantity` for zero, negative, or non-finite quantities
    pub fn scaled(&self, quantity: f64) -> Result<Self, NutritionDataError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(NutritionDataError::InvalidQuantity(quantity));
        }
        Ok(Self {
            name: self.name.clone(),
            serving_grams: self.serving_grams * quantity,
            macros: self.macros.scale(quantity),
            fiber_g: self.fiber_g.map(|v| v * quantity),
            sugar_g: self.sugar_g.map(|v| v * quantity),
            sodium_mg: self.sodium_mg.map(|v| v * quantity),
            ingredients: self.ingredients.clone(),
            source: self.source,
            confidence: self.confidence,
        })
    }

    /// Normalized food name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serving size in grams
    #[must_use]
    pub const fn serving_grams(&self) -> f64 {
        self.serving_grams
    }

    /// Energy and macronutrients for the serving
    #[must_use]
    pub const fn macros(&self) -> Macros {
        self.macros
    }

    /// Energy in kcal
    #[must_use]
    pub const fn calories(&self) -> f64 {
        self.macros.calories
    }

    /// Fiber in grams, when known
    #[must_use]
    pub const fn fiber_g(&self) -> Option<f64> {
        self.fiber_g
    }

    /// Sugar in grams, when known
    #[must_use]
    pub const fn sugar_g(&self) -> Option<f64> {
        self.sugar_g
    }

    /// Sodium in milligrams, when known
    #[must_use]
    pub const fn sodium_mg(&self) -> Option<f64> {
        self.sodium_mg
    }

    /// Known ingredients, lowercase
    #[must_use]
    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    /// Provenance tag
    #[must_use]
    pub const fn source(&self) -> FactSource {
        self.source
    }

    /// Confidence tier, derived from the source
    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }
}

/// Wire shape of a `FoodFact`; converted back through validation
#[derive(Debug, Deserialize)]
struct FoodFactRecord {
    name: String,
    serving_grams: f64,
    #[serde(flatten)]
    macros: Macros,
    #[serde(default)]
    fiber_g: Option<f64>,
    #[serde(default)]
    sugar_g: Option<f64>,
    #[serde(default)]
    sodium_mg: Option<f64>,
    #[serde(default)]
    ingredients: Vec<String>,
    source: FactSource,
    // Stored value is ignored; confidence is always re-derived from `source`
    #[serde(default)]
    #[allow(dead_code)]
    confidence: Option<Confidence>,
}

impl TryFrom<FoodFactRecord> for FoodFact {
    type Error = NutritionDataError;

    fn try_from(record: FoodFactRecord) -> Result<Self, Self::Error> {
        let facts = NutritionFacts {
            name: record.name,
            serving_grams: record.serving_grams,
            macros: record.macros,
            fiber_g: record.fiber_g,
            sugar_g: record.sugar_g,
            sodium_mg: record.sodium_mg,
            ingredients: record.ingredients,
        };
        Self::new(facts, record.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn egg() -> NutritionFacts {
        NutritionFacts::new("Boiled Egg", 50.0, Macros::new(78.0, 6.3, 0.6, 5.3))
    }

    #[test]
    fn test_confidence_follows_source() {
        let fact = FoodFact::new(egg(), FactSource::AiEstimate).unwrap();
        assert_eq!(fact.confidence(), Confidence::Low);
        assert_eq!(fact.name(), "boiled egg");
    }

    #[test]
    fn test_rejects_negative_macros() {
        let mut facts = egg();
        facts.macros.fat_g = -1.0;
        assert!(matches!(
            FoodFact::new(facts, FactSource::LocalCatalog),
            Err(NutritionDataError::InvalidNutrient { field: "fat_g", .. })
        ));
    }

    #[test]
    fn test_deserialize_rederives_confidence() {
        let json = r#"{"name":"egg","serving_grams":50,"calories":78,"protein_g":6.3,
            "carbs_g":0.6,"fat_g":5.3,"source":"ai_estimate","confidence":"high"}"#;
        let fact: FoodFact = serde_json::from_str(json).unwrap();
        assert_eq!(fact.confidence(), Confidence::Low);
    }

    #[test]
    fn test_deserialize_rejects_negative_values() {
        let json = r#"{"name":"egg","serving_grams":50,"calories":-5,"protein_g":6.3,
            "carbs_g":0.6,"fat_g":5.3,"source":"local_catalog"}"#;
        assert!(serde_json::from_str::<FoodFact>(json).is_err());
    }

    #[test]
    fn test_scaled_multiplies_everything() {
        let fact = FoodFact::new(egg(), FactSource::LocalCatalog).unwrap();
        let two = fact.scaled(2.0).unwrap();
        assert!((two.calories() - 156.0).abs() < f64::EPSILON);
        assert!((two.serving_grams() - 100.0).abs() < f64::EPSILON);
        assert!(fact.scaled(0.0).is_err());
    }
}
