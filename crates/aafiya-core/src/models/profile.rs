// ABOUTME: Session user profile with goals, allergies, restrictions, and BMI metrics
// ABOUTME: Partial profile updates and restriction-to-ingredient keyword mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Youngest age the coaching flow accepts
const MIN_PROFILE_AGE: u32 = 14;

/// Primary nutrition goal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Reduce body weight
    LoseWeight,
    /// Keep current weight
    Maintain,
    /// Increase body weight
    GainWeight,
    /// Gain lean mass
    BuildMuscle,
}

impl Goal {
    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LoseWeight => "lose weight",
            Self::Maintain => "maintain",
            Self::GainWeight => "gain weight",
            Self::BuildMuscle => "build muscle",
        }
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "lose weight" | "weight loss" | "lose" => Ok(Self::LoseWeight),
            "maintain" | "maintenance" => Ok(Self::Maintain),
            "gain weight" | "gain" => Ok(Self::GainWeight),
            "build muscle" | "muscle gain" | "muscle" => Ok(Self::BuildMuscle),
            other => Err(format!("unknown goal: {other}")),
        }
    }
}

/// Weekly activity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Inactive,
    /// Light exercise 1-3 days a week
    Light,
    /// Moderate exercise 3-5 days a week
    Moderate,
    /// Hard exercise most days
    Active,
    /// Daily hard exercise or physical job
    VeryActive,
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "inactive" | "sedentary" => Ok(Self::Inactive),
            "light" => Ok(Self::Light),
            "moderate" => Ok(Self::Moderate),
            "active" => Ok(Self::Active),
            "very active" => Ok(Self::VeryActive),
            other => Err(format!("unknown activity level: {other}")),
        }
    }
}

/// WHO adult BMI category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    /// BMI below 18.5
    Underweight,
    /// 18.5 up to 25
    Normal,
    /// 25 up to 30
    Overweight,
    /// 30 and above
    Obese,
}

impl BmiCategory {
    /// Classify a BMI value
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        };
        f.write_str(label)
    }
}

/// BMI derived from the profile's weight and height
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyMetrics {
    /// Body mass index (kg/m²)
    pub bmi: f64,
    /// WHO category
    pub category: BmiCategory,
}

/// Person being coached in the current session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Age in years
    pub age: Option<u32>,
    /// Free-form gender
    pub gender: Option<String>,
    /// Body weight in kilograms
    pub weight_kg: Option<f64>,
    /// Height in centimeters
    pub height_cm: Option<f64>,
    /// Weekly activity level
    pub activity_level: Option<ActivityLevel>,
    /// Primary goal
    pub goal: Option<Goal>,
    /// Weeks to work toward the goal
    pub goal_duration_weeks: Option<u32>,
    /// Allergens, lowercase
    pub allergies: BTreeSet<String>,
    /// Dietary restrictions (vegetarian, gluten-free, ...), lowercase
    pub restrictions: BTreeSet<String>,
    /// Foods the user prefers to avoid, lowercase
    pub disliked_foods: BTreeSet<String>,
    /// Medical conditions or other notes
    pub health_notes: Option<String>,
}

impl UserProfile {
    /// BMI and category, when weight and height are both known and positive
    #[must_use]
    pub fn body_metrics(&self) -> Option<BodyMetrics> {
        let weight = self.weight_kg.filter(|w| *w > 0.0)?;
        let height_m = self.height_cm.filter(|h| *h > 0.0)? / 100.0;
        let bmi = weight / (height_m * height_m);
        Some(BodyMetrics {
            bmi,
            category: BmiCategory::from_bmi(bmi),
        })
    }

    /// Whether age, weight, height, and goal are all set to usable values
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.age.is_some_and(|age| age >= MIN_PROFILE_AGE)
            && self.weight_kg.is_some_and(|w| w > 0.0)
            && self.height_cm.is_some_and(|h| h > 0.0)
            && self.goal.is_some()
    }

    /// Ingredient keywords forbidden by the dietary restrictions
    ///
    /// Unknown restrictions contribute no keywords.
    #[must_use]
    pub fn forbidden_keywords(&self) -> BTreeSet<&'static str> {
        self.restrictions
            .iter()
            .flat_map(|r| restriction_keywords(r).iter().copied())
            .collect()
    }

    /// Apply a partial update, returning whether anything changed
    pub fn apply(&mut self, update: ProfileUpdate) -> bool {
        let before = self.clone();
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(gender) = update.gender {
            self.gender = Some(gender);
        }
        if let Some(weight) = update.weight_kg {
            self.weight_kg = Some(weight);
        }
        if let Some(height) = update.height_cm {
            self.height_cm = Some(height);
        }
        if let Some(level) = update.activity_level {
            self.activity_level = Some(level);
        }
        if let Some(goal) = update.goal {
            self.goal = Some(goal);
        }
        if let Some(weeks) = update.goal_duration_weeks {
            self.goal_duration_weeks = Some(weeks);
        }
        if let Some(notes) = update.health_notes {
            self.health_notes = Some(notes);
        }
        self.allergies.extend(normalize_all(update.add_allergies));
        for allergy in normalize_all(update.remove_allergies) {
            self.allergies.remove(&allergy);
        }
        self.restrictions.extend(normalize_all(update.add_restrictions));
        for restriction in normalize_all(update.remove_restrictions) {
            self.restrictions.remove(&restriction);
        }
        self.disliked_foods.extend(normalize_all(update.add_disliked));
        for food in normalize_all(update.remove_disliked) {
            self.disliked_foods.remove(&food);
        }
        *self != before
    }
}

fn normalize_all(values: Vec<String>) -> impl Iterator<Item = String> {
    values
        .into_iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Dairy ingredients, including cheeses whose names never say "cheese"
pub const DAIRY_INGREDIENTS: &[&str] = &[
    "milk", "cheese", "yogurt", "butter", "cream", "whey", "casein", "ghee", "kefir", "custard",
    "gelato", "mozzarella", "parmesan", "cheddar", "ricotta", "feta", "brie", "gouda", "paneer",
    "mascarpone", "halloumi",
];

/// Ingredient keywords excluded by a named dietary restriction
#[must_use]
pub fn restriction_keywords(restriction: &str) -> &'static [&'static str] {
    const MEAT: &[&str] = &[
        "chicken", "beef", "pork", "turkey", "lamb", "bacon", "ham", "steak", "sausage",
    ];
    const VEGETARIAN: &[&str] = &[
        "chicken", "beef", "pork", "turkey", "lamb", "bacon", "ham", "steak", "sausage", "fish",
        "salmon", "tuna", "shrimp", "gelatin",
    ];
    const VEGAN: &[&str] = &[
        "chicken", "beef", "pork", "turkey", "lamb", "bacon", "ham", "steak", "sausage", "fish",
        "salmon", "tuna", "shrimp", "gelatin", "egg", "honey", "milk", "cheese", "yogurt",
        "butter", "cream", "whey", "casein", "ghee", "kefir", "custard", "gelato", "mozzarella",
        "parmesan", "cheddar", "ricotta", "feta", "brie", "gouda", "paneer", "mascarpone",
        "halloumi",
    ];
    const GLUTEN_FREE: &[&str] = &["wheat", "gluten", "barley", "rye", "bread", "pasta", "flour"];
    const NUT_FREE: &[&str] = &["peanut", "almond", "walnut", "cashew", "pecan", "hazelnut"];
    const HALAL: &[&str] = &["pork", "bacon", "ham", "alcohol", "wine", "gelatin"];

    match restriction.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
        "vegetarian" => VEGETARIAN,
        "vegan" | "plant-based" => VEGAN,
        "pescatarian" => MEAT,
        "gluten-free" | "celiac" => GLUTEN_FREE,
        "dairy-free" | "lactose-free" | "lactose-intolerant" => DAIRY_INGREDIENTS,
        "nut-free" => NUT_FREE,
        "halal" => HALAL,
        _ => &[],
    }
}

/// Explicit partial profile update; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    /// New age
    pub age: Option<u32>,
    /// New gender
    pub gender: Option<String>,
    /// New weight in kilograms
    pub weight_kg: Option<f64>,
    /// New height in centimeters
    pub height_cm: Option<f64>,
    /// New activity level
    pub activity_level: Option<ActivityLevel>,
    /// New goal
    pub goal: Option<Goal>,
    /// New goal duration
    pub goal_duration_weeks: Option<u32>,
    /// New health notes
    pub health_notes: Option<String>,
    /// Allergens to add
    pub add_allergies: Vec<String>,
    /// Allergens to remove
    pub remove_allergies: Vec<String>,
    /// Restrictions to add
    pub add_restrictions: Vec<String>,
    /// Restrictions to remove
    pub remove_restrictions: Vec<String>,
    /// Disliked foods to add
    pub add_disliked: Vec<String>,
    /// Disliked foods to remove
    pub remove_disliked: Vec<String>,
}
