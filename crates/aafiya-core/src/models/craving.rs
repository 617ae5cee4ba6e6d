// ABOUTME: Craving categories and healthy substitute records
// ABOUTME: Closed CravingCategory set, ColorTag, Substitute, and CravingSuggestion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::nutrition::Macros;

/// Closed set of craving categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CravingCategory {
    /// Desserts, candy, chocolate
    Sweet,
    /// Chips, pretzels, salty snacks
    Salty,
    /// Fries, fried chicken, crispy food
    Fried,
    /// Bread, pasta, pizza
    CarbHeavy,
    /// Ice cream, cheese, creamy sauces
    Creamy,
    /// Tiredness or a need for energy
    LowEnergy,
}

impl CravingCategory {
    /// Every category, in classification priority order
    pub const ALL: [Self; 6] = [
        Self::Sweet,
        Self::Salty,
        Self::Fried,
        Self::CarbHeavy,
        Self::Creamy,
        Self::LowEnergy,
    ];

    /// Stable identifier
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sweet => "sweet",
            Self::Salty => "salty",
            Self::Fried => "fried",
            Self::CarbHeavy => "carb_heavy",
            Self::Creamy => "creamy",
            Self::LowEnergy => "low_energy",
        }
    }
}

impl fmt::Display for CravingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CravingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown craving category: {s}"))
    }
}

/// Plate color a substitute contributes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    /// Leafy greens, herbs
    Green,
    /// Carrots, squash, sweet potato
    Orange,
    /// Berries, tomatoes
    Red,
    /// Blueberries, beets
    Purple,
    /// Bananas, corn, peppers
    Yellow,
    /// Nuts, seeds, whole grains
    Brown,
    /// Dairy, cauliflower, oats
    White,
}

impl ColorTag {
    /// Emoji badge used in chat output
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Green => "🟢",
            Self::Orange => "🟠",
            Self::Red => "🔴",
            Self::Purple => "🟣",
            Self::Yellow => "🟡",
            Self::Brown => "🟫",
            Self::White => "⚪",
        }
    }
}

/// A healthier alternative for a craving
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Substitute {
    /// Display name
    pub name: String,
    /// Nutrition summary for one typical serving
    pub macros: Macros,
    /// Sugar in grams per serving
    pub sugar_g: f64,
    /// Ingredients, lowercase
    pub ingredients: Vec<String>,
    /// Why this satisfies the craving
    pub rationale: String,
    /// Plate color
    pub color: ColorTag,
    /// Short nutritional benefit
    pub benefit: String,
}

/// Ranked substitutes for one craving
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CravingSuggestion {
    /// Matched category, `None` when the generic default list was used
    pub category: Option<CravingCategory>,
    /// Safe substitutes, best first
    pub substitutes: Vec<Substitute>,
    /// Substitutes removed because they conflict with allergies or restrictions
    pub excluded: usize,
}

impl CravingSuggestion {
    /// Whether the generic fallback list was used
    #[must_use]
    pub const fn is_generic(&self) -> bool {
        self.category.is_none()
    }
}
