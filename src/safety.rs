// ABOUTME: Allergy and dietary-restriction cross-checks plus content safety screening
// ABOUTME: Warnings are attached to results and responses, never used to silently drop data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Safety checks shared by the resolver, the craving advisor, and the assembler.

use std::collections::BTreeSet;
use std::fmt;

use aafiya_core::models::{restriction_keywords, UserProfile, DAIRY_INGREDIENTS};
use serde::{Deserialize, Serialize};

use crate::catalog::matching::{normalize_name, singularize};

/// A conflict between a food and the user's profile
///
/// Not a failure: the food is still returned, with this warning attached.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SafetyWarning {
    /// The food contains something the user is allergic to
    AllergyConflict {
        /// Allergy as the user entered it
        allergen: String,
        /// Food item that triggered the warning
        item: String,
    },
    /// The food breaks one of the user's dietary restrictions
    RestrictionConflict {
        /// Restriction as the user entered it
        restriction: String,
        /// Food item that triggered the warning
        item: String,
    },
}

impl fmt::Display for SafetyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllergyConflict { allergen, item } => {
                write!(f, "allergy warning: {item} may contain {allergen}")
            }
            Self::RestrictionConflict { restriction, item } => {
                write!(f, "{item} does not fit your {restriction} diet")
            }
        }
    }
}

/// Terms that indicate an allergen family in ingredient lists
fn allergen_terms(allergy: &str) -> Vec<String> {
    let family: &[&str] = match allergy {
        "dairy" | "lactose" | "milk" => DAIRY_INGREDIENTS,
        "gluten" | "wheat" | "celiac" => &["wheat", "gluten", "bread", "pasta", "barley", "rye"],
        "nut" | "tree nut" => &[
            "almond", "walnut", "cashew", "pecan", "pistachio", "hazelnut", "nut",
        ],
        "shellfish" => &["shrimp", "prawn", "crab", "lobster", "shellfish", "clam", "mussel"],
        "fish" | "seafood" => &["fish", "salmon", "tuna", "cod", "anchovy"],
        "soy" => &["soy", "tofu", "edamame", "tempeh"],
        _ => &[],
    };
    let mut terms: Vec<String> = family.iter().map(|t| (*t).to_owned()).collect();
    terms.push(allergy.to_owned());
    terms
}

/// Singular lowercase form used for comparisons (`Peanuts` -> `peanut`)
fn canonical(term: &str) -> String {
    normalize_name(term)
}

/// Whole-word containment over normalized text
fn mentions(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && format!(" {haystack} ").contains(&format!(" {needle} "))
}

fn food_text(name: &str, ingredients: &[String]) -> String {
    let mut parts = vec![canonical(name)];
    parts.extend(ingredients.iter().map(|i| canonical(i)));
    parts.join(" | ")
}

/// Cross-check a food's name and known ingredients against the profile
#[must_use]
pub fn check_food(name: &str, ingredients: &[String], profile: &UserProfile) -> Vec<SafetyWarning> {
    let text = food_text(name, ingredients);
    let mut warnings = BTreeSet::new();

    for allergy in &profile.allergies {
        let allergy_key = canonical(allergy);
        if allergen_terms(&allergy_key).iter().any(|t| mentions(&text, t)) {
            warnings.insert(SafetyWarning::AllergyConflict {
                allergen: allergy.clone(),
                item: name.to_owned(),
            });
        }
    }

    for restriction in &profile.restrictions {
        let keywords = restriction_keywords(&restriction.to_lowercase());
        if keywords.iter().any(|k| mentions(&text, &canonical(k))) {
            warnings.insert(SafetyWarning::RestrictionConflict {
                restriction: restriction.clone(),
                item: name.to_owned(),
            });
        }
    }

    warnings.into_iter().collect()
}

/// Whether any warning would be raised for the food
#[must_use]
pub fn conflicts(name: &str, ingredients: &[String], profile: &UserProfile) -> bool {
    !check_food(name, ingredients, profile).is_empty()
}

/// Whether the food is on the user's disliked list
#[must_use]
pub fn is_disliked(name: &str, ingredients: &[String], profile: &UserProfile) -> bool {
    let text = food_text(name, ingredients);
    profile
        .disliked_foods
        .iter()
        .any(|food| mentions(&text, &canonical(food)))
}

// ============================================================================
// Content screening
// ============================================================================

/// Kind of unsafe content detected in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsafeCategory {
    /// Crash diets, starvation, skipping meals
    ExtremeDieting,
    /// Diet pills, laxatives, and similar
    HarmfulSubstances,
    /// Eating-disorder vocabulary
    EatingDisorder,
    /// Self-punishment and self-harm
    DangerousBehavior,
    /// Miracle cures and impossible results
    MedicalMisinformation,
}

const UNSAFE_PATTERNS: &[(UnsafeCategory, &[&str])] = &[
    (
        UnsafeCategory::ExtremeDieting,
        &[
            "extreme diet", "crash diet", "starvation", "no food", "skip meals", "fast for days",
            "eat nothing", "stop eating", "starve yourself", "severe calorie restriction",
        ],
    ),
    (
        UnsafeCategory::HarmfulSubstances,
        &[
            "laxatives", "diet pills", "weight loss pills", "appetite suppressants",
            "fat burners", "detox tea", "cleanse pills", "poison",
        ],
    ),
    (
        UnsafeCategory::EatingDisorder,
        &[
            "eating disorder", "anorexia", "bulimia", "binge eating", "purging", "vomiting",
            "pro ana", "pro mia", "thinspo", "skinny goals",
        ],
    ),
    (
        UnsafeCategory::DangerousBehavior,
        &[
            "self harm", "hurt yourself", "punish yourself", "exercise until exhaustion",
            "workout punishment", "food punishment", "guilt eating",
        ],
    ),
    (
        UnsafeCategory::MedicalMisinformation,
        &[
            "cure diabetes", "cure cancer", "magic weight loss", "miracle diet",
            "lose 20 pounds in a week", "instant results", "no exercise needed",
        ],
    ),
];

/// One matched unsafe pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyFlag {
    /// Pattern family
    pub category: UnsafeCategory,
    /// Phrase that matched
    pub pattern: &'static str,
}

fn flatten(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Screen a user query for unsafe nutrition content
#[must_use]
pub fn screen_query(text: &str) -> Vec<SafetyFlag> {
    let flat = flatten(text);
    UNSAFE_PATTERNS
        .iter()
        .flat_map(|(category, patterns)| patterns.iter().map(move |p| (*category, *p)))
        .filter(|(_, pattern)| mentions(&flat, &flatten(pattern)))
        .map(|(category, pattern)| SafetyFlag { category, pattern })
        .collect()
}

// ============================================================================
// Response review
// ============================================================================

const MEAL_VOCABULARY: &[&str] = &[
    "recipe", "ingredient", "meal", "cook", "bake", "dish", "snack", "breakfast", "lunch",
    "dinner", "serve", "prepare",
];

/// Allergy and preference review of a generated answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseReview {
    /// Allergies mentioned by the response
    pub allergens: Vec<String>,
    /// Disliked foods mentioned by the response
    pub disliked: Vec<String>,
    /// Response text with warnings prepended
    pub annotated: String,
}

impl ResponseReview {
    /// No allergen was mentioned
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.allergens.is_empty()
    }
}

/// Review a generated response that talks about food preparation
///
/// Responses without meal vocabulary are returned unchanged.
#[must_use]
pub fn review_response(response: &str, profile: &UserProfile) -> ResponseReview {
    let flat = flatten(response);
    let text = flat
        .split_whitespace()
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ");
    if !MEAL_VOCABULARY.iter().any(|w| mentions(&text, w)) {
        return ResponseReview {
            annotated: response.to_owned(),
            ..ResponseReview::default()
        };
    }

    let allergens: Vec<String> = profile
        .allergies
        .iter()
        .filter(|a| allergen_terms(&canonical(a)).iter().any(|t| mentions(&text, t)))
        .cloned()
        .collect();
    let disliked: Vec<String> = profile
        .disliked_foods
        .iter()
        .filter(|f| mentions(&text, &canonical(f)))
        .cloned()
        .collect();

    let mut notes = Vec::new();
    if !allergens.is_empty() {
        notes.push(format!("ALLERGY WARNING: This contains: {}", allergens.join(", ")));
    }
    if !disliked.is_empty() {
        notes.push(format!(
            "Note: This contains foods you prefer to avoid: {}",
            disliked.join(", ")
        ));
    }
    if !allergens.is_empty() {
        notes.push(
            "Please consult a healthcare provider before eating foods you are allergic to."
                .to_owned(),
        );
    }

    let annotated = if notes.is_empty() {
        response.to_owned()
    } else {
        format!("{}\n\n{response}", notes.join("\n"))
    };
    ResponseReview {
        allergens,
        disliked,
        annotated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        let mut profile = UserProfile::default();
        profile.allergies.insert("Peanuts".to_owned());
        profile.allergies.insert("dairy".to_owned());
        profile.restrictions.insert("vegetarian".to_owned());
        profile.disliked_foods.insert("mushrooms".to_owned());
        profile
    }

    #[test]
    fn test_allergy_family_match() {
        let warnings = check_food("pizza", &["cheese".to_owned(), "wheat".to_owned()], &profile());
        assert_eq!(
            warnings,
            vec![SafetyWarning::AllergyConflict {
                allergen: "dairy".to_owned(),
                item: "pizza".to_owned(),
            }]
        );
    }

    #[test]
    fn test_named_cheese_is_dairy() {
        let warnings = check_food("pita pizza", &["mozzarella".to_owned()], &profile());
        assert!(warnings.iter().any(|w| matches!(
            w,
            SafetyWarning::AllergyConflict { allergen, .. } if allergen == "dairy"
        )));

        let mut vegan = UserProfile::default();
        vegan.restrictions.insert("vegan".to_owned());
        assert!(conflicts("caprese", &["tomato".to_owned(), "mozzarella".to_owned()], &vegan));
        let mut dairy_free = UserProfile::default();
        dairy_free.restrictions.insert("dairy-free".to_owned());
        let saag = ["spinach".to_owned(), "paneer".to_owned()];
        assert!(conflicts("saag paneer", &saag, &dairy_free));
    }

    #[test]
    fn test_plural_allergy_matches_singular_ingredient() {
        let warnings = check_food("energy bar", &["peanut butter".to_owned()], &profile());
        assert!(warnings.iter().any(|w| matches!(
            w,
            SafetyWarning::AllergyConflict { allergen, .. } if allergen == "Peanuts"
        )));
    }

    #[test]
    fn test_restriction_conflict_from_name() {
        let warnings = check_food("chicken breast", &[], &profile());
        assert!(matches!(
            warnings.as_slice(),
            [SafetyWarning::RestrictionConflict { restriction, .. }] if restriction == "vegetarian"
        ));
        assert!(check_food("apple", &["apple".to_owned()], &profile()).is_empty());
    }

    #[test]
    fn test_screen_query_flags_patterns() {
        let flags = screen_query("What DIET PILLS work best if I skip meals?");
        let patterns: Vec<_> = flags.iter().map(|f| f.pattern).collect();
        assert_eq!(patterns, vec!["skip meals", "diet pills"]);
        assert!(screen_query("Is a banana a good snack?").is_empty());
        // Whole words only
        assert!(screen_query("I love a pro banana smoothie").is_empty());
    }

    #[test]
    fn test_review_response_annotates_recipes() {
        let review = review_response(
            "Recipe: toss pasta with mushrooms and a splash of milk.",
            &profile(),
        );
        assert!(!review.is_safe());
        assert_eq!(review.allergens, vec!["dairy"]);
        assert_eq!(review.disliked, vec!["mushrooms"]);
        assert!(review.annotated.starts_with("ALLERGY WARNING"));

        let plain = review_response("Milk has calcium.", &profile());
        assert!(plain.is_safe());
        assert_eq!(plain.annotated, "Milk has calcium.");
    }
}
