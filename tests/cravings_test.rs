// ABOUTME: Integration tests for craving classification and substitute suggestions
// ABOUTME: Validates allergy filtering, caps, generic fallback, and category inputs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use aafiya::config::CravingConfig;
use aafiya::cravings::{classify, mentions_craving, CravingAdvisor, CravingInput};
use aafiya::models::{CravingCategory, ProfileUpdate, UserProfile};
use common::init_test_logging;

fn profile_with_allergies(allergies: &[&str]) -> UserProfile {
    let mut profile = UserProfile::default();
    profile.apply(ProfileUpdate {
        add_allergies: allergies.iter().map(|a| (*a).to_owned()).collect(),
        ..ProfileUpdate::default()
    });
    profile
}

#[test]
fn test_chocolate_cake_is_a_sweet_craving() {
    assert_eq!(classify("I want chocolate cake"), Some(CravingCategory::Sweet));
    assert!(mentions_craving("I want chocolate cake"));
}

#[test]
fn test_peanut_allergy_excludes_peanut_substitutes() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig::default());
    let profile = profile_with_allergies(&["peanut"]);

    let suggestion = advisor.suggest(CravingInput::Text("I want chocolate cake"), &profile);

    assert_eq!(suggestion.category, Some(CravingCategory::Sweet));
    assert_eq!(suggestion.excluded, 1);
    assert!(!suggestion.substitutes.is_empty());
    assert!(suggestion.substitutes.len() <= 4);
    for item in &suggestion.substitutes {
        assert!(!item.name.to_lowercase().contains("peanut"));
        assert!(item.ingredients.iter().all(|i| !i.contains("peanut")));
    }
}

#[test]
fn test_dairy_allergy_excludes_named_cheeses() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig::default());
    let profile = profile_with_allergies(&["dairy"]);

    let suggestion = advisor.suggest(CravingInput::Category(CravingCategory::CarbHeavy), &profile);

    assert_eq!(suggestion.excluded, 1);
    assert_eq!(suggestion.substitutes.len(), 3);
    assert!(suggestion
        .substitutes
        .iter()
        .all(|item| !item.ingredients.iter().any(|i| i == "mozzarella")));
}

#[test]
fn test_explicit_category_input() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig::default());

    let suggestion = advisor.suggest(
        CravingInput::Category(CravingCategory::Salty),
        &UserProfile::default(),
    );

    assert_eq!(suggestion.category, Some(CravingCategory::Salty));
    assert_eq!(suggestion.excluded, 0);
    assert_eq!(suggestion.substitutes.len(), 4);
}

#[test]
fn test_cap_follows_configuration() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig { max_substitutes: 2 });

    let suggestion = advisor.suggest(CravingInput::Text("craving fries"), &UserProfile::default());

    assert_eq!(suggestion.category, Some(CravingCategory::Fried));
    assert_eq!(suggestion.substitutes.len(), 2);
}

#[test]
fn test_unclassified_craving_uses_generic_list() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig::default());

    let suggestion = advisor.suggest(
        CravingInput::Text("I'm craving something"),
        &UserProfile::default(),
    );

    assert!(suggestion.is_generic());
    assert!(!suggestion.substitutes.is_empty());
}

#[test]
fn test_every_substitute_excluded_leaves_empty_list() {
    init_test_logging();
    let advisor = CravingAdvisor::new(&CravingConfig::default());
    let profile = profile_with_allergies(&["almond", "banana", "walnut"]);

    let suggestion = advisor.suggest(CravingInput::Text("so tired today"), &profile);

    assert_eq!(suggestion.category, Some(CravingCategory::LowEnergy));
    assert!(suggestion.substitutes.is_empty());
    assert_eq!(suggestion.excluded, 4);
}
