// ABOUTME: Built-in food reference table with exact, edit-distance, and token-overlap lookup
// ABOUTME: Read-only catalog entries with aliases, ingredients and composite components
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Local food catalog.
//!
//! The catalog is the first rung of the resolution ladder. It is built once
//! and never mutated, so it is shared across sessions without locking.

/// Mention parsing and fuzzy matching helpers
pub mod matching;

use std::collections::HashMap;
use std::iter;
use std::sync::LazyLock;

use aafiya_core::models::{Macros, NutritionFacts};

use crate::config::ResolverConfig;
use matching::{edit_distance, token_overlap};

/// One reference food with nutrition for a typical serving
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Canonical lowercase name
    pub name: &'static str,
    /// Serving size in grams
    pub serving_grams: f64,
    /// Macros per serving
    pub macros: Macros,
    /// Fiber per serving in grams
    pub fiber_g: Option<f64>,
    /// Sugar per serving in grams
    pub sugar_g: Option<f64>,
    /// Sodium per serving in milligrams
    pub sodium_mg: Option<f64>,
    /// Alternative names that match exactly
    pub aliases: &'static [&'static str],
    /// Known ingredients for allergy checks
    pub ingredients: &'static [&'static str],
    /// Other entries this food is made of, with serving multipliers
    pub components: &'static [(&'static str, f64)],
}

impl CatalogEntry {
    /// Create an entry with core macros per serving
    #[must_use]
    pub const fn new(
        name: &'static str,
        serving_grams: f64,
        calories: f64,
        protein_g: f64,
        carbs_g: f64,
        fat_g: f64,
    ) -> Self {
        Self {
            name,
            serving_grams,
            macros: Macros::new(calories, protein_g, carbs_g, fat_g),
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            aliases: &[],
            ingredients: &[],
            components: &[],
        }
    }

    /// Add aliases for matching
    #[must_use]
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Add known ingredients
    #[must_use]
    pub const fn with_ingredients(mut self, ingredients: &'static [&'static str]) -> Self {
        self.ingredients = ingredients;
        self
    }

    /// Mark the entry as a composite of other catalog entries
    #[must_use]
    pub const fn with_components(mut self, components: &'static [(&'static str, f64)]) -> Self {
        self.components = components;
        self
    }

    /// Add fiber, sugar, and sodium per serving
    #[must_use]
    pub const fn with_extras(mut self, fiber_g: f64, sugar_g: f64, sodium_mg: f64) -> Self {
        self.fiber_g = Some(fiber_g);
        self.sugar_g = Some(sugar_g);
        self.sodium_mg = Some(sodium_mg);
        self
    }

    /// Nutrition facts for one serving
    #[must_use]
    pub fn facts(&self) -> NutritionFacts {
        NutritionFacts {
            name: self.name.to_owned(),
            serving_grams: self.serving_grams,
            macros: self.macros,
            fiber_g: self.fiber_g,
            sugar_g: self.sugar_g,
            sodium_mg: self.sodium_mg,
            ingredients: self.ingredients.iter().map(|i| (*i).to_owned()).collect(),
        }
    }

    fn keys(&self) -> impl Iterator<Item = &'static str> {
        iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// How a catalog entry was matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Name or alias equal to the query
    Exact,
    /// Within the configured edit distance
    EditDistance(usize),
    /// Enough shared tokens
    TokenOverlap(f64),
}

/// A successful catalog lookup
#[derive(Debug, Clone, Copy)]
pub struct CatalogMatch<'a> {
    /// Matched entry
    pub entry: &'a CatalogEntry,
    /// Name or alias that matched
    pub key: &'static str,
    /// Match quality
    pub kind: MatchKind,
}

/// Reference table mapping normalized food names to nutrition facts
#[derive(Debug)]
pub struct FoodCatalog {
    entries: Vec<CatalogEntry>,
    exact: HashMap<&'static str, usize>,
}

static BUILTIN_CATALOG: LazyLock<FoodCatalog> =
    LazyLock::new(|| FoodCatalog::new(builtin_entries()));

impl FoodCatalog {
    /// Build a catalog from entries; later duplicates of a key are ignored
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut exact = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            for key in entry.keys() {
                exact.entry(key).or_insert(index);
            }
        }
        Self { entries, exact }
    }

    /// Process-wide built-in catalog
    pub fn builtin() -> &'static Self {
        &BUILTIN_CATALOG
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in definition order
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entry whose name or alias equals `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.exact.get(name).map(|&index| &self.entries[index])
    }

    /// Look up a normalized name: exact, then edit distance, then token overlap
    ///
    /// Ties are broken by the smallest distance (or highest overlap), then by
    /// the shortest key, then alphabetically, so results are deterministic.
    #[must_use]
    pub fn lookup(&self, name: &str, config: &ResolverConfig) -> Option<CatalogMatch<'_>> {
        if let Some(&index) = self.exact.get(name) {
            let entry = &self.entries[index];
            let key = entry.keys().find(|k| *k == name).unwrap_or(entry.name);
            return Some(CatalogMatch {
                entry,
                key,
                kind: MatchKind::Exact,
            });
        }
        self.lookup_edit_distance(name, config)
            .or_else(|| self.lookup_token_overlap(name, config))
    }

    fn lookup_edit_distance(
        &self,
        name: &str,
        config: &ResolverConfig,
    ) -> Option<CatalogMatch<'_>> {
        if name.chars().count() < config.min_fuzzy_name_len {
            return None;
        }
        self.entries
            .iter()
            .flat_map(|entry| entry.keys().map(move |key| (entry, key)))
            .filter(|(_, key)| key.chars().count() >= config.min_fuzzy_name_len)
            .map(|(entry, key)| (entry, key, edit_distance(name, key)))
            .filter(|(_, _, distance)| *distance <= config.max_edit_distance)
            .min_by(|a, b| a.2.cmp(&b.2).then(a.1.len().cmp(&b.1.len())).then(a.1.cmp(b.1)))
            .map(|(entry, key, distance)| CatalogMatch {
                entry,
                key,
                kind: MatchKind::EditDistance(distance),
            })
    }

    fn lookup_token_overlap(
        &self,
        name: &str,
        config: &ResolverConfig,
    ) -> Option<CatalogMatch<'_>> {
        self.entries
            .iter()
            .flat_map(|entry| entry.keys().map(move |key| (entry, key)))
            .map(|(entry, key)| (entry, key, token_overlap(name, key)))
            .filter(|(_, _, overlap)| *overlap >= config.min_token_overlap)
            .max_by(|a, b| {
                a.2.total_cmp(&b.2)
                    .then(b.1.len().cmp(&a.1.len()))
                    .then(b.1.cmp(a.1))
            })
            .map(|(entry, key, overlap)| CatalogMatch {
                entry,
                key,
                kind: MatchKind::TokenOverlap(overlap),
            })
    }

    /// Component facts of a composite entry, each scaled to its share of one serving
    ///
    /// Returns `None` for simple entries or when a component is missing from
    /// the catalog, in which case the entry is treated as a single item.
    #[must_use]
    pub fn components(&self, entry: &CatalogEntry) -> Option<Vec<(NutritionFacts, f64)>> {
        if entry.components.is_empty() {
            return None;
        }
        entry
            .components
            .iter()
            .map(|(name, servings)| self.get(name).map(|c| (c.facts(), *servings)))
            .collect()
    }
}

/// Built-in reference foods, values per typical serving
// Long function: flat data table
fn builtin_entries() -> Vec<CatalogEntry> {
    vec![
        // === Eggs and dairy ===
        CatalogEntry::new("egg", 50.0, 70.0, 6.0, 0.5, 5.0)
            .with_aliases(&["whole egg", "fried egg", "scrambled egg"])
            .with_ingredients(&["egg"]),
        CatalogEntry::new("boiled egg", 50.0, 78.0, 6.3, 0.6, 5.3)
            .with_aliases(&["hard boiled egg", "soft boiled egg", "hardboiled egg"])
            .with_ingredients(&["egg"])
            .with_extras(0.0, 0.6, 62.0),
        CatalogEntry::new("cheese", 28.0, 113.0, 7.0, 1.0, 9.0)
            .with_aliases(&["cheddar", "cheddar cheese"])
            .with_ingredients(&["milk", "cheese", "dairy"]),
        CatalogEntry::new("milk", 100.0, 42.0, 3.4, 5.0, 1.0)
            .with_aliases(&["skim milk", "low fat milk"])
            .with_ingredients(&["milk", "dairy"]),
        CatalogEntry::new("yogurt", 100.0, 59.0, 10.0, 3.6, 0.4)
            .with_aliases(&["greek yogurt", "yoghurt", "plain yogurt"])
            .with_ingredients(&["milk", "yogurt", "dairy"])
            .with_extras(0.0, 3.2, 36.0),
        // === Grains and bread ===
        CatalogEntry::new("toast", 30.0, 80.0, 3.0, 15.0, 1.0)
            .with_aliases(&["toasted bread"])
            .with_ingredients(&["wheat", "gluten", "bread"]),
        CatalogEntry::new("bread", 28.0, 75.0, 2.5, 14.0, 1.0)
            .with_aliases(&["white bread", "whole wheat bread", "bread slice"])
            .with_ingredients(&["wheat", "gluten", "bread"])
            .with_extras(1.1, 1.5, 135.0),
        CatalogEntry::new("rice", 100.0, 130.0, 2.7, 28.0, 0.3)
            .with_aliases(&["white rice", "cooked rice", "steamed rice"])
            .with_ingredients(&["rice"])
            .with_extras(0.4, 0.1, 1.0),
        CatalogEntry::new("pasta", 140.0, 220.0, 8.0, 44.0, 1.5)
            .with_aliases(&["spaghetti", "penne", "macaroni"])
            .with_ingredients(&["wheat", "gluten", "pasta"])
            .with_extras(2.5, 0.8, 1.0),
        CatalogEntry::new("oatmeal", 100.0, 68.0, 2.4, 12.0, 1.4)
            .with_aliases(&["oat", "porridge", "rolled oat"])
            .with_ingredients(&["oat"])
            .with_extras(1.7, 0.3, 49.0),
        CatalogEntry::new("cereal", 100.0, 379.0, 8.0, 84.0, 1.5)
            .with_aliases(&["breakfast cereal", "corn flake"])
            .with_ingredients(&["corn", "wheat", "sugar"]),
        // === Fruit ===
        CatalogEntry::new("apple", 182.0, 95.0, 0.5, 25.0, 0.3)
            .with_ingredients(&["apple"])
            .with_extras(4.4, 19.0, 2.0),
        CatalogEntry::new("banana", 118.0, 105.0, 1.3, 27.0, 0.4)
            .with_ingredients(&["banana"])
            .with_extras(3.1, 14.0, 1.0),
        CatalogEntry::new("orange", 100.0, 47.0, 0.9, 12.0, 0.1)
            .with_ingredients(&["orange"])
            .with_extras(2.4, 9.4, 0.0),
        CatalogEntry::new("grape", 100.0, 69.0, 0.6, 16.0, 0.4)
            .with_ingredients(&["grape"])
            .with_extras(0.9, 16.0, 2.0),
        CatalogEntry::new("avocado", 150.0, 234.0, 2.9, 12.0, 21.0)
            .with_ingredients(&["avocado"])
            .with_extras(10.0, 1.0, 10.0),
        // === Vegetables ===
        CatalogEntry::new("broccoli", 91.0, 25.0, 3.0, 5.0, 0.3)
            .with_ingredients(&["broccoli"])
            .with_extras(2.4, 1.5, 30.0),
        CatalogEntry::new("carrot", 61.0, 25.0, 0.5, 6.0, 0.1)
            .with_ingredients(&["carrot"])
            .with_extras(1.7, 2.9, 42.0),
        CatalogEntry::new("potato", 100.0, 77.0, 2.0, 17.0, 0.1)
            .with_aliases(&["baked potato", "boiled potato"])
            .with_ingredients(&["potato"]),
        CatalogEntry::new("tomato", 100.0, 18.0, 0.9, 3.9, 0.2)
            .with_ingredients(&["tomato"])
            .with_extras(1.2, 2.6, 5.0),
        CatalogEntry::new("lettuce", 36.0, 5.0, 0.5, 1.0, 0.1).with_ingredients(&["lettuce"]),
        CatalogEntry::new("spinach", 30.0, 7.0, 0.9, 1.1, 0.1)
            .with_aliases(&["baby spinach"])
            .with_ingredients(&["spinach"]),
        CatalogEntry::new("salad", 85.0, 20.0, 1.5, 4.0, 0.2)
            .with_aliases(&["green salad", "garden salad", "side salad"])
            .with_ingredients(&["lettuce", "tomato", "cucumber"]),
        // === Meat and fish ===
        CatalogEntry::new("chicken breast", 100.0, 165.0, 31.0, 0.0, 3.6)
            .with_aliases(&["chicken", "grilled chicken", "roast chicken"])
            .with_ingredients(&["chicken"])
            .with_extras(0.0, 0.0, 74.0),
        CatalogEntry::new("beef", 100.0, 250.0, 26.0, 0.0, 17.0)
            .with_aliases(&["ground beef", "minced beef"])
            .with_ingredients(&["beef"]),
        CatalogEntry::new("steak", 100.0, 271.0, 26.0, 0.0, 19.0)
            .with_aliases(&["sirloin", "ribeye"])
            .with_ingredients(&["beef"]),
        CatalogEntry::new("pork", 100.0, 242.0, 27.0, 0.0, 14.0)
            .with_aliases(&["pork chop"])
            .with_ingredients(&["pork"]),
        CatalogEntry::new("turkey", 100.0, 135.0, 25.0, 0.0, 3.2)
            .with_aliases(&["turkey breast"])
            .with_ingredients(&["turkey"]),
        CatalogEntry::new("salmon", 100.0, 208.0, 22.0, 0.0, 12.0)
            .with_aliases(&["salmon fillet"])
            .with_ingredients(&["salmon", "fish"])
            .with_extras(0.0, 0.0, 59.0),
        CatalogEntry::new("tuna", 100.0, 154.0, 25.0, 0.0, 5.0)
            .with_aliases(&["canned tuna"])
            .with_ingredients(&["tuna", "fish"]),
        CatalogEntry::new("fish", 100.0, 206.0, 22.0, 0.0, 12.0)
            .with_aliases(&["white fish", "cod"])
            .with_ingredients(&["fish"]),
        // === Prepared dishes ===
        CatalogEntry::new("pizza", 107.0, 285.0, 12.0, 36.0, 10.0)
            .with_aliases(&["pizza slice", "cheese pizza"])
            .with_ingredients(&["wheat", "gluten", "cheese", "milk", "tomato"]),
        CatalogEntry::new("burger", 150.0, 354.0, 17.0, 31.0, 17.0)
            .with_aliases(&["hamburger", "cheeseburger"])
            .with_ingredients(&["beef", "wheat", "gluten", "bread"]),
        CatalogEntry::new("sandwich", 150.0, 300.0, 15.0, 35.0, 12.0)
            .with_ingredients(&["bread", "wheat", "gluten"]),
        CatalogEntry::new("chicken sandwich", 190.0, 247.0, 21.0, 30.0, 4.0)
            .with_aliases(&["grilled chicken sandwich"])
            .with_ingredients(&["bread", "wheat", "gluten", "chicken"])
            .with_components(&[
                ("bread", 2.0),
                ("chicken breast", 0.5),
                ("lettuce", 1.0),
                ("tomato", 0.5),
            ]),
        CatalogEntry::new("soup", 245.0, 85.0, 4.0, 12.0, 2.5)
            .with_aliases(&["vegetable soup"])
            .with_ingredients(&["vegetable"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_alias_lookup() {
        let catalog = FoodCatalog::builtin();
        let config = ResolverConfig::default();
        let found = catalog.lookup("hard boiled egg", &config).unwrap();
        assert_eq!(found.entry.name, "boiled egg");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn test_misspelling_matches_within_distance() {
        let config = ResolverConfig::default();
        let found = FoodCatalog::builtin().lookup("brocoli", &config).unwrap();
        assert_eq!(found.entry.name, "broccoli");
        assert_eq!(found.kind, MatchKind::EditDistance(1));
    }

    #[test]
    fn test_short_names_do_not_fuzzy_match() {
        let config = ResolverConfig::default();
        // Short names only match exactly
        assert!(FoodCatalog::builtin().lookup("ham", &config).is_none());
    }

    #[test]
    fn test_unknown_dish_does_not_match() {
        let config = ResolverConfig::default();
        assert!(FoodCatalog::builtin()
            .lookup("quinoa tabbouleh", &config)
            .is_none());
    }

    #[test]
    fn test_composite_components_resolve() {
        let catalog = FoodCatalog::builtin();
        let sandwich = catalog.get("chicken sandwich").unwrap();
        let components = catalog.components(sandwich).unwrap();
        assert_eq!(components.len(), 4);
        assert_eq!(components[0].0.name, "bread");
        assert!(catalog.components(catalog.get("apple").unwrap()).is_none());
    }
}
