// ABOUTME: Food mention normalization and fuzzy name matching helpers
// ABOUTME: Quantity parsing, unit-word stripping, singularization, edit distance, token overlap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;
use std::mem;

use aafiya_core::errors::NutritionDataError;

use crate::external::units;

/// Words describing a container or portion rather than the food itself
const UNIT_WORDS: &[&str] = &[
    "serving", "piece", "slice", "cup", "bowl", "plate", "portion", "of", "glass", "handful",
    "small", "medium", "large", "some",
];

/// How much of the food was mentioned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    /// Multiple of the source's serving size
    Servings(f64),
    /// Explicit mass in grams
    Grams(f64),
}

impl Amount {
    /// Multiplier to apply to a serving of `serving_grams`
    #[must_use]
    pub fn multiplier(&self, serving_grams: f64) -> f64 {
        match *self {
            Self::Servings(count) => count,
            Self::Grams(grams) => grams / serving_grams,
        }
    }
}

/// A food mention split into amount and normalized name
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMention {
    /// Lowercased, singularized name without quantity or unit words
    pub name: String,
    /// Parsed amount, one serving when none was given
    pub amount: Amount,
}

/// Lowercase and split into word tokens, keeping numbers like `1.5` and `1/2`
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '/' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '.' || c == '\'' || c == '/'))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_number(token: &str) -> Option<f64> {
    if let Some((num, den)) = token.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den != 0.0).then(|| num / den);
    }
    token.parse().ok()
}

fn number_word(token: &str) -> Option<f64> {
    let value = match token {
        "a" | "an" | "one" | "single" => 1.0,
        "two" | "couple" | "pair" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "dozen" => 12.0,
        "half" => 0.5,
        _ => return None,
    };
    Some(value)
}

/// Split `200g` into `(200, "g")` when the suffix is a mass unit
fn number_with_unit(token: &str) -> Option<(f64, &str)> {
    let split = token.find(|c: char| c.is_alphabetic())?;
    let (num, unit) = token.split_at(split);
    let value = parse_number(num)?;
    units::is_mass_unit(unit).then_some((value, unit))
}

/// Read the leading quantity, returning the amount and how many tokens it used
fn leading_amount(tokens: &[String]) -> (Option<Amount>, usize) {
    let Some(first) = tokens.first() else {
        return (None, 0);
    };

    if let Some((value, unit)) = number_with_unit(first) {
        return (units::mass_to_grams(value, unit).map(Amount::Grams), 1);
    }

    let (count, mut used) = if let Some(value) = parse_number(first) {
        (value, 1)
    } else if let Some(value) = number_word(first) {
        // "a couple", "a dozen", "a half"
        match tokens.get(1).and_then(|t| number_word(t)) {
            Some(next) if first == "a" || first == "an" => (next, 2),
            _ => (value, 1),
        }
    } else {
        return (None, 0);
    };

    // "half a sandwich"
    if count < 1.0 && matches!(tokens.get(used).map(String::as_str), Some("a" | "an")) {
        used += 1;
    }

    if let Some(unit) = tokens.get(used) {
        if let Some(grams) = units::mass_to_grams(count, unit) {
            return (Some(Amount::Grams(grams)), used + 1);
        }
    }
    if tokens.get(used).map(String::as_str) == Some("x") {
        used += 1;
    }
    (Some(Amount::Servings(count)), used)
}

/// Reduce a plural noun to its singular form (`eggs` -> `egg`, `berries` -> `berry`)
#[must_use]
pub fn singularize(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 {
        return word.to_owned();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        // berries -> berry, but cookies -> cookie
        return if stem.ends_with('r') || stem.ends_with('d') {
            format!("{stem}y")
        } else {
            format!("{stem}ie")
        };
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}o");
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_owned();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_owned();
    }
    word.to_owned()
}

/// Normalize a free-text food name without reading a quantity
#[must_use]
pub fn normalize_name(text: &str) -> String {
    tokenize(text)
        .iter()
        .filter(|t| !UNIT_WORDS.contains(&t.as_str()))
        .map(|t| singularize(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a mention such as `2 boiled eggs` or `half a cup of rice`
///
/// # Errors
///
/// Returns `NutritionDataError::EmptyName` when no food name remains and
/// `NutritionDataError::InvalidQuantity` for zero or negative quantities and
/// `NutritionDataError::QuantityTooLarge` above `max_quantity`
pub fn parse_mention(text: &str, max_quantity: f64) -> Result<ParsedMention, NutritionDataError> {
    let tokens = tokenize(text);
    let (amount, used) = leading_amount(&tokens);
    let name = normalize_name(&tokens[used..].join(" "));
    if name.is_empty() {
        return Err(NutritionDataError::EmptyName);
    }

    let amount = amount.unwrap_or(Amount::Servings(1.0));
    if let Amount::Servings(count) = amount {
        if count.is_nan() || count <= 0.0 {
            return Err(NutritionDataError::InvalidQuantity(count));
        }
        if count > max_quantity {
            return Err(NutritionDataError::QuantityTooLarge {
                value: count,
                max: max_quantity,
            });
        }
    }
    if let Amount::Grams(grams) = amount {
        if !(grams.is_finite() && grams > 0.0) {
            return Err(NutritionDataError::InvalidQuantity(grams));
        }
    }
    Ok(ParsedMention { name, amount })
}

/// Split a mention on `and`, `with`, `&`, and commas
///
/// Returns the single trimmed mention when there is nothing to split.
#[must_use]
pub fn split_conjunctions(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace(['&', ';', '+'], ",");
    let mut parts = Vec::new();
    for piece in lowered.split(',') {
        let mut current = Vec::new();
        for word in piece.split_whitespace() {
            if word == "and" || word == "with" {
                if !current.is_empty() {
                    parts.push(current.join(" "));
                    current.clear();
                }
            } else {
                current.push(word);
            }
        }
        if !current.is_empty() {
            parts.push(current.join(" "));
        }
    }
    parts
}

/// Levenshtein distance over characters
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Shared-token ratio `|A ∩ B| / max(|A|, |B|)`
#[must_use]
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();
    let larger = left.len().max(right.len());
    if larger == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / larger as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_quantity() {
        let parsed = parse_mention("2 Boiled Eggs", 24.0).unwrap();
        assert_eq!(parsed.name, "boiled egg");
        assert_eq!(parsed.amount, Amount::Servings(2.0));
    }

    #[test]
    fn test_parse_number_words() {
        assert_eq!(
            parse_mention("a couple of bananas", 24.0).unwrap().amount,
            Amount::Servings(2.0)
        );
        assert_eq!(
            parse_mention("a dozen eggs", 24.0).unwrap().amount,
            Amount::Servings(12.0)
        );
        let half = parse_mention("half a sandwich", 24.0).unwrap();
        assert_eq!(half.amount, Amount::Servings(0.5));
        assert_eq!(half.name, "sandwich");
    }

    #[test]
    fn test_parse_strips_unit_words() {
        let parsed = parse_mention("1 cup of rice", 24.0).unwrap();
        assert_eq!(parsed.name, "rice");
        assert_eq!(
            parse_mention("quinoa tabbouleh bowl", 24.0).unwrap().name,
            "quinoa tabbouleh"
        );
    }

    #[test]
    fn test_parse_mass_amounts() {
        assert_eq!(
            parse_mention("200g chicken breast", 24.0).unwrap().amount,
            Amount::Grams(200.0)
        );
        let Amount::Grams(grams) = parse_mention("4 oz salmon", 24.0).unwrap().amount else {
            panic!("expected grams");
        };
        assert!((grams - 113.4).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_bad_quantities() {
        assert!(matches!(
            parse_mention("0 apples", 24.0),
            Err(NutritionDataError::InvalidQuantity(_))
        ));
        let too_many = parse_mention("100 eggs", 24.0).unwrap_err();
        assert!(matches!(too_many, NutritionDataError::QuantityTooLarge { .. }));
        assert_eq!(too_many.to_string(), "quantity 100 exceeds the maximum of 24 servings");
        assert!(matches!(
            parse_mention("2 cups", 24.0),
            Err(NutritionDataError::EmptyName)
        ));
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("eggs"), "egg");
        assert_eq!(singularize("berries"), "berry");
        assert_eq!(singularize("cookies"), "cookie");
        assert_eq!(singularize("tomatoes"), "tomato");
        assert_eq!(singularize("sandwiches"), "sandwich");
        assert_eq!(singularize("hummus"), "hummus");
        assert_eq!(singularize("glass"), "glass");
    }

    #[test]
    fn test_split_conjunctions() {
        assert_eq!(
            split_conjunctions("2 eggs and toast, with an apple"),
            vec!["2 eggs", "toast", "an apple"]
        );
        assert_eq!(split_conjunctions("salmon"), vec!["salmon"]);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("brocoli", "broccoli"), 1);
        assert_eq!(edit_distance("salmon", "salmon"), 0);
        assert_eq!(edit_distance("", "egg"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_token_overlap() {
        let overlap = token_overlap("grilled chicken breast", "chicken breast");
        assert!((overlap - 2.0 / 3.0).abs() < 1e-9);
        assert!(token_overlap("quinoa tabbouleh", "chicken breast") < f64::EPSILON);
    }
}
