// ABOUTME: Craving classification and healthy substitute ranking
// ABOUTME: Static substitute table filtered against the user's allergies and restrictions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Craving Advisor
//!
//! Free text is classified into a [`CravingCategory`] by keyword. Each
//! category has a healthy reference profile; substitutes are ranked by how
//! far their calories, sugar and fat exceed that reference (falling short
//! costs a quarter as much). Substitutes that conflict with the profile are
//! removed, disliked ones are moved to the end.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use aafiya_core::models::{
    ColorTag, CravingCategory, CravingSuggestion, Macros, Substitute, UserProfile,
};
use tracing::debug;

use crate::catalog::matching::{singularize, tokenize};
use crate::config::CravingConfig;
use crate::safety;

/// Calories, sugar and fat a healthy answer to a craving should stay near
#[derive(Debug, Clone, Copy)]
struct HealthyReference {
    calories: f64,
    sugar_g: f64,
    fat_g: f64,
}

/// Static substitutes for one category
struct CravingMapping {
    category: CravingCategory,
    keywords: &'static [&'static str],
    reference: HealthyReference,
    substitutes: Vec<Substitute>,
}

const EXCESS_WEIGHT: f64 = 1.0;
const DEFICIT_WEIGHT: f64 = 0.25;

fn substitute(
    name: &str,
    (calories, protein_g, carbs_g, fat_g): (f64, f64, f64, f64),
    sugar_g: f64,
    ingredients: &[&str],
    rationale: &str,
    color: ColorTag,
    benefit: &str,
) -> Substitute {
    Substitute {
        name: name.to_owned(),
        macros: Macros::new(calories, protein_g, carbs_g, fat_g),
        sugar_g,
        ingredients: ingredients.iter().map(|i| (*i).to_owned()).collect(),
        rationale: rationale.to_owned(),
        color,
        benefit: benefit.to_owned(),
    }
}

static CRAVING_MAPPINGS: LazyLock<Vec<CravingMapping>> = LazyLock::new(|| {
    vec![
        CravingMapping {
            category: CravingCategory::Sweet,
            keywords: &[
                "sweet", "sugar", "sugary", "dessert", "candy", "chocolate", "cake", "cookie",
                "brownie", "donut", "doughnut", "pastry", "pie", "cupcake", "caramel", "fudge",
            ],
            reference: HealthyReference {
                calories: 100.0,
                sugar_g: 10.0,
                fat_g: 3.0,
            },
            substitutes: vec![
                substitute(
                    "Blueberries",
                    (85.0, 1.1, 21.0, 0.5),
                    15.0,
                    &["blueberry"],
                    "Naturally sweet and easy to snack on",
                    ColorTag::Purple,
                    "Antioxidants & natural sweetness",
                ),
                substitute(
                    "Baked sweet potato with cinnamon",
                    (112.0, 2.0, 26.0, 0.1),
                    5.4,
                    &["sweet potato", "cinnamon"],
                    "Caramelizes when baked, dessert-like without added sugar",
                    ColorTag::Orange,
                    "Complex carbs & beta carotene",
                ),
                substitute(
                    "Strawberries",
                    (49.0, 1.0, 12.0, 0.5),
                    7.4,
                    &["strawberry"],
                    "Bright sweetness for very few calories",
                    ColorTag::Red,
                    "Vitamin C & fiber",
                ),
                substitute(
                    "Dark chocolate dipped strawberries",
                    (140.0, 2.0, 16.0, 8.0),
                    11.0,
                    &["strawberry", "dark chocolate"],
                    "Keeps the chocolate, in a small portion",
                    ColorTag::Red,
                    "Flavanols & vitamin C",
                ),
                substitute(
                    "Apple slices with peanut butter",
                    (190.0, 4.0, 25.0, 8.0),
                    19.0,
                    &["apple", "peanut butter"],
                    "Sweet crunch with protein that keeps you full",
                    ColorTag::Red,
                    "Fiber & plant protein",
                ),
                substitute(
                    "Greek yogurt with honey",
                    (150.0, 15.0, 17.0, 2.5),
                    16.0,
                    &["greek yogurt", "honey"],
                    "Creamy and sweet with a protein boost",
                    ColorTag::White,
                    "Protein & probiotics",
                ),
            ],
        },
        CravingMapping {
            category: CravingCategory::Salty,
            keywords: &[
                "salty", "salt", "chip", "crisp", "pretzel", "popcorn", "cracker", "nacho",
            ],
            reference: HealthyReference {
                calories: 120.0,
                sugar_g: 3.0,
                fat_g: 5.0,
            },
            substitutes: vec![
                substitute(
                    "Kale chips",
                    (58.0, 2.5, 8.0, 2.8),
                    1.0,
                    &["kale", "olive oil", "salt"],
                    "Crunchy and salty, baked instead of fried",
                    ColorTag::Green,
                    "Iron & vitamin K",
                ),
                substitute(
                    "Air-popped popcorn",
                    (93.0, 3.0, 19.0, 1.1),
                    0.2,
                    &["popcorn", "salt"],
                    "Whole grain crunch with a light sprinkle of salt",
                    ColorTag::Yellow,
                    "Whole grain fiber",
                ),
                substitute(
                    "Roasted chickpeas",
                    (134.0, 7.0, 22.0, 2.1),
                    3.8,
                    &["chickpea", "olive oil", "paprika"],
                    "Savory and crunchy with real protein",
                    ColorTag::Brown,
                    "Plant protein & fiber",
                ),
                substitute(
                    "Salted edamame",
                    (121.0, 12.0, 9.0, 5.0),
                    2.2,
                    &["edamame", "soy", "salt"],
                    "Salty, poppable and filling",
                    ColorTag::Green,
                    "Complete plant protein",
                ),
                substitute(
                    "Roasted carrots",
                    (50.0, 1.0, 11.0, 0.4),
                    5.5,
                    &["carrot", "olive oil"],
                    "Roasting brings out a savory, crispy edge",
                    ColorTag::Orange,
                    "Beta carotene & fiber",
                ),
            ],
        },
        CravingMapping {
            category: CravingCategory::Fried,
            keywords: &[
                "fry", "fried", "crispy", "crunchy", "tempura", "nugget", "wing", "deep",
            ],
            reference: HealthyReference {
                calories: 150.0,
                sugar_g: 4.0,
                fat_g: 6.0,
            },
            substitutes: vec![
                substitute(
                    "Roasted carrots",
                    (50.0, 1.0, 11.0, 0.4),
                    5.5,
                    &["carrot", "olive oil"],
                    "Fry-shaped and crisp at the edges",
                    ColorTag::Orange,
                    "Beta carotene & fiber",
                ),
                substitute(
                    "Air-fried squash",
                    (82.0, 1.8, 21.0, 0.2),
                    4.0,
                    &["butternut squash"],
                    "Crispy outside, soft inside, no deep fryer",
                    ColorTag::Yellow,
                    "Vitamins A & C",
                ),
                substitute(
                    "Baked sweet potato wedges",
                    (130.0, 2.0, 24.0, 3.5),
                    5.0,
                    &["sweet potato", "olive oil"],
                    "Fries texture with more fiber",
                    ColorTag::Orange,
                    "Complex carbs & beta carotene",
                ),
                substitute(
                    "Kale chips",
                    (58.0, 2.5, 8.0, 2.8),
                    1.0,
                    &["kale", "olive oil", "salt"],
                    "The crunch without the oil bath",
                    ColorTag::Green,
                    "Iron & vitamin K",
                ),
                substitute(
                    "Oven-baked chicken tenders",
                    (180.0, 24.0, 8.0, 6.0),
                    0.5,
                    &["chicken", "whole wheat breadcrumbs", "egg"],
                    "Crunchy coating, baked not fried",
                    ColorTag::Brown,
                    "Lean protein",
                ),
            ],
        },
        CravingMapping {
            category: CravingCategory::CarbHeavy,
            keywords: &[
                "bread", "pasta", "pizza", "noodle", "bagel", "carb", "spaghetti", "burrito",
                "toast", "rice",
            ],
            reference: HealthyReference {
                calories: 250.0,
                sugar_g: 5.0,
                fat_g: 8.0,
            },
            substitutes: vec![
                substitute(
                    "Zucchini noodles with marinara",
                    (90.0, 3.0, 14.0, 3.0),
                    8.0,
                    &["zucchini", "tomato", "garlic"],
                    "Twirls like pasta at a fraction of the calories",
                    ColorTag::Green,
                    "Vitamin C & potassium",
                ),
                substitute(
                    "Whole wheat pita pizza",
                    (240.0, 12.0, 34.0, 7.0),
                    4.0,
                    &["whole wheat pita", "tomato", "mozzarella"],
                    "Real pizza flavor on a thin whole-grain base",
                    ColorTag::Red,
                    "Fiber & calcium",
                ),
                substitute(
                    "Cauliflower rice bowl",
                    (120.0, 6.0, 12.0, 5.0),
                    4.0,
                    &["cauliflower", "vegetables", "olive oil"],
                    "Fills the bowl like rice",
                    ColorTag::White,
                    "Vitamin C & fiber",
                ),
                substitute(
                    "Quinoa salad",
                    (220.0, 8.0, 34.0, 6.0),
                    2.0,
                    &["quinoa", "cucumber", "tomato", "olive oil"],
                    "Hearty grain that brings its own protein",
                    ColorTag::Yellow,
                    "Complete protein & magnesium",
                ),
            ],
        },
        CravingMapping {
            category: CravingCategory::Creamy,
            keywords: &[
                "creamy", "cream", "cheese", "cheesy", "milkshake", "alfredo", "mac", "custard",
                "gelato",
            ],
            reference: HealthyReference {
                calories: 150.0,
                sugar_g: 8.0,
                fat_g: 5.0,
            },
            substitutes: vec![
                substitute(
                    "Frozen banana nice cream",
                    (105.0, 1.3, 27.0, 0.4),
                    14.0,
                    &["banana"],
                    "Blends to a soft-serve texture with one ingredient",
                    ColorTag::Yellow,
                    "Potassium & natural energy",
                ),
                substitute(
                    "Greek yogurt parfait",
                    (170.0, 15.0, 20.0, 3.0),
                    14.0,
                    &["greek yogurt", "berries", "oats"],
                    "Thick and creamy with protein",
                    ColorTag::White,
                    "Protein & probiotics",
                ),
                substitute(
                    "Avocado chocolate mousse",
                    (200.0, 3.0, 18.0, 14.0),
                    9.0,
                    &["avocado", "cocoa", "maple syrup"],
                    "Silky texture from healthy fats",
                    ColorTag::Green,
                    "Monounsaturated fats & fiber",
                ),
                substitute(
                    "Cottage cheese with pineapple",
                    (160.0, 14.0, 18.0, 2.5),
                    14.0,
                    &["cottage cheese", "pineapple"],
                    "Creamy, sweet and high in protein",
                    ColorTag::Yellow,
                    "Protein & vitamin C",
                ),
            ],
        },
        CravingMapping {
            category: CravingCategory::LowEnergy,
            keywords: &[
                "tired", "energy", "energizing", "fatigue", "fatigued", "exhausted", "sleepy",
                "drained", "sluggish",
            ],
            reference: HealthyReference {
                calories: 180.0,
                sugar_g: 12.0,
                fat_g: 10.0,
            },
            substitutes: vec![
                substitute(
                    "Almonds",
                    (164.0, 6.0, 6.0, 14.0),
                    1.2,
                    &["almond"],
                    "Steady energy from fats and protein",
                    ColorTag::Brown,
                    "Healthy fats & protein",
                ),
                substitute(
                    "Spinach and berry smoothie",
                    (150.0, 4.0, 30.0, 1.5),
                    18.0,
                    &["spinach", "berries", "banana"],
                    "Quick lift with iron and natural sugars",
                    ColorTag::Green,
                    "Iron & B vitamins",
                ),
                substitute(
                    "Banana",
                    (105.0, 1.3, 27.0, 0.4),
                    14.0,
                    &["banana"],
                    "Fast, portable carbohydrates",
                    ColorTag::Yellow,
                    "Potassium & natural energy",
                ),
                substitute(
                    "Oatmeal with walnuts",
                    (250.0, 8.0, 32.0, 10.0),
                    2.0,
                    &["oats", "walnut"],
                    "Slow-release carbs to avoid a crash",
                    ColorTag::Brown,
                    "Fiber & omega-3s",
                ),
            ],
        },
    ]
});

static GENERIC_REFERENCE: HealthyReference = HealthyReference {
    calories: 100.0,
    sugar_g: 5.0,
    fat_g: 3.0,
};

static GENERIC_SUBSTITUTES: LazyLock<Vec<Substitute>> = LazyLock::new(|| {
    vec![
        substitute(
            "Leafy green salad",
            (35.0, 2.0, 6.0, 0.5),
            2.0,
            &["lettuce", "spinach", "cucumber"],
            "Low in sugar and fat, big on volume",
            ColorTag::Green,
            "Vitamins & minerals",
        ),
        substitute(
            "Carrot and pepper sticks",
            (45.0, 1.0, 10.0, 0.3),
            5.0,
            &["carrot", "bell pepper"],
            "Crunchy, colorful and light",
            ColorTag::Orange,
            "Beta carotene & fiber",
        ),
        substitute(
            "Mixed berries",
            (70.0, 1.0, 17.0, 0.4),
            11.0,
            &["strawberry", "raspberry", "blueberry"],
            "Fruit sweetness with plenty of fiber",
            ColorTag::Red,
            "Antioxidants & vitamin C",
        ),
        substitute(
            "Roasted beet slices",
            (60.0, 2.0, 13.0, 0.2),
            9.0,
            &["beet", "olive oil"],
            "Earthy and satisfying",
            ColorTag::Purple,
            "Anthocyanins & brain health",
        ),
        substitute(
            "Hummus with cucumber",
            (120.0, 4.0, 10.0, 7.0),
            1.0,
            &["chickpea", "tahini", "cucumber"],
            "Savory dip with fiber and protein",
            ColorTag::Green,
            "Plant protein & fiber",
        ),
    ]
});

/// What the user is craving
#[derive(Debug, Clone, Copy)]
pub enum CravingInput<'a> {
    /// An already known category
    Category(CravingCategory),
    /// Free text such as "I want chocolate cake"
    Text(&'a str),
}

/// Classify free text into a craving category
///
/// The category with the most keyword hits wins; ties go to the earlier
/// category in [`CravingCategory::ALL`].
#[must_use]
pub fn classify(text: &str) -> Option<CravingCategory> {
    let tokens: BTreeSet<String> = tokenize(text).iter().map(|t| singularize(t)).collect();
    let mut best: Option<(CravingCategory, usize)> = None;
    for mapping in CRAVING_MAPPINGS.iter() {
        let hits = mapping
            .keywords
            .iter()
            .filter(|k| tokens.contains(**k))
            .count();
        if hits > best.map_or(0, |(_, top)| top) {
            best = Some((mapping.category, hits));
        }
    }
    best.map(|(category, _)| category)
}

const CRAVING_CUES: &[&str] = &[
    "crav",
    "in the mood for",
    "hungry for",
    "want something",
    "feel like eating",
];

/// Whether the text reads like a craving at all
///
/// Needs an explicit craving cue, a "want" next to craving vocabulary, or a
/// low-energy complaint; a bare mention of sugar in an intake question is not
/// a craving.
#[must_use]
pub fn mentions_craving(text: &str) -> bool {
    let lower = text.to_lowercase();
    if CRAVING_CUES.iter().any(|cue| lower.contains(cue)) {
        return true;
    }
    match classify(text) {
        Some(CravingCategory::LowEnergy) => true,
        Some(_) => tokenize(text).iter().any(|t| t == "want"),
        None => false,
    }
}

fn asymmetric(actual: f64, reference: f64) -> f64 {
    let scale = reference.max(1.0);
    let diff = (actual - reference) / scale;
    if diff > 0.0 {
        diff * EXCESS_WEIGHT
    } else {
        -diff * DEFICIT_WEIGHT
    }
}

fn distance(candidate: &Substitute, reference: HealthyReference) -> f64 {
    asymmetric(candidate.macros.calories, reference.calories)
        + asymmetric(candidate.sugar_g, reference.sugar_g)
        + asymmetric(candidate.macros.fat_g, reference.fat_g)
}

/// Ranks substitutes for cravings against a user profile
#[derive(Debug, Clone)]
pub struct CravingAdvisor {
    max_substitutes: usize,
}

impl CravingAdvisor {
    /// Advisor returning at most `config.max_substitutes` items
    #[must_use]
    pub const fn new(config: &CravingConfig) -> Self {
        Self {
            max_substitutes: config.max_substitutes,
        }
    }

    /// Ordered safe substitutes for the craving
    ///
    /// Unmatched text falls back to a generic low-sugar, low-fat list. An
    /// empty result means every candidate conflicted with the profile.
    #[must_use]
    pub fn suggest(&self, input: CravingInput<'_>, profile: &UserProfile) -> CravingSuggestion {
        let category = match input {
            CravingInput::Category(category) => Some(category),
            CravingInput::Text(text) => classify(text),
        };

        let (candidates, reference) = category
            .and_then(|c| CRAVING_MAPPINGS.iter().find(|m| m.category == c))
            .map_or((GENERIC_SUBSTITUTES.as_slice(), GENERIC_REFERENCE), |m| {
                (m.substitutes.as_slice(), m.reference)
            });

        let (safe, excluded): (Vec<&Substitute>, Vec<&Substitute>) = candidates
            .iter()
            .partition(|s| !safety::conflicts(&s.name, &s.ingredients, profile));

        let mut ranked: Vec<(bool, f64, &Substitute)> = safe
            .into_iter()
            .map(|s| {
                (
                    safety::is_disliked(&s.name, &s.ingredients, profile),
                    distance(s, reference),
                    s,
                )
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.total_cmp(&b.1))
        });

        debug!(
            category = category.map_or("generic", |c| c.as_str()),
            candidates = candidates.len(),
            excluded = excluded.len(),
            "Ranked craving substitutes"
        );

        CravingSuggestion {
            category,
            substitutes: ranked
                .into_iter()
                .take(self.max_substitutes)
                .map(|(_, _, s)| s.clone())
                .collect(),
            excluded: excluded.len(),
        }
    }
}
