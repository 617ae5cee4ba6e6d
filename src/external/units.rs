// ABOUTME: Canonical unit conversion for nutrition values from heterogeneous sources
// ABOUTME: Energy to kcal, nutrient mass to grams or milligrams, serving sizes to grams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Unit normalization table.
//!
//! Canonical units are kcal for energy, grams for mass and macros, and
//! milligrams for sodium. Values reported per 100 g are rescaled to the
//! reported serving with [`per_100g_to_serving`].

/// Kilojoules per kilocalorie
const KJ_PER_KCAL: f64 = 4.184;

/// Weight conversion constants (to grams)
const GRAMS_PER_OZ: f64 = 28.35;
const GRAMS_PER_LB: f64 = 453.6;
const GRAMS_PER_KG: f64 = 1000.0;
const MG_PER_G: f64 = 1000.0;
const UG_PER_G: f64 = 1_000_000.0;

/// Serving sizes in millilitres are treated as water density
const GRAMS_PER_ML: f64 = 1.0;

/// Reference mass most nutrient databases report against
pub const REFERENCE_GRAMS: f64 = 100.0;

fn normalize_unit(unit: &str) -> String {
    unit.trim().to_lowercase().replace('μ', "µ")
}

/// Convert an energy value to kcal
///
/// Returns `None` for units that are not energy units.
#[must_use]
pub fn energy_to_kcal(value: f64, unit: &str) -> Option<f64> {
    match normalize_unit(unit).as_str() {
        "kcal" | "cal" | "calorie" | "calories" | "kilocalorie" | "kilocalories" => Some(value),
        "kj" | "kilojoule" | "kilojoules" => Some(value / KJ_PER_KCAL),
        _ => None,
    }
}

/// Convert a nutrient or food mass to grams
///
/// Returns `None` for units that are not mass units. Millilitres are accepted
/// using water density, which is only meaningful for serving sizes.
#[must_use]
pub fn mass_to_grams(value: f64, unit: &str) -> Option<f64> {
    match normalize_unit(unit).as_str() {
        "g" | "gram" | "grams" | "gr" | "grm" => Some(value),
        "mg" | "milligram" | "milligrams" => Some(value / MG_PER_G),
        "µg" | "ug" | "mcg" | "microgram" | "micrograms" => Some(value / UG_PER_G),
        "kg" | "kilogram" | "kilograms" => Some(value * GRAMS_PER_KG),
        "oz" | "ounce" | "ounces" => Some(value * GRAMS_PER_OZ),
        "lb" | "lbs" | "pound" | "pounds" => Some(value * GRAMS_PER_LB),
        "ml" | "millilitre" | "milliliter" | "millilitres" | "milliliters" => {
            Some(value * GRAMS_PER_ML)
        }
        _ => None,
    }
}

/// Convert a nutrient mass to milligrams (used for sodium)
#[must_use]
pub fn mass_to_milligrams(value: f64, unit: &str) -> Option<f64> {
    mass_to_grams(value, unit).map(|grams| grams * MG_PER_G)
}

/// Whether `unit` names a mass unit understood by [`mass_to_grams`]
#[must_use]
pub fn is_mass_unit(unit: &str) -> bool {
    mass_to_grams(1.0, unit).is_some()
}

/// Rescale a value reported per 100 g to a serving of `serving_grams`
#[must_use]
pub fn per_100g_to_serving(value: f64, serving_grams: f64) -> f64 {
    value * serving_grams / REFERENCE_GRAMS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_energy_conversion() {
        assert!(close(energy_to_kcal(418.4, "kJ").unwrap(), 100.0));
        assert!(close(energy_to_kcal(52.0, "KCAL").unwrap(), 52.0));
        assert!(energy_to_kcal(1.0, "g").is_none());
    }

    #[test]
    fn test_mass_conversion_table() {
        assert!(close(mass_to_grams(500.0, "mg").unwrap(), 0.5));
        assert!(close(mass_to_grams(2_000_000.0, "µg").unwrap(), 2.0));
        assert!(close(mass_to_grams(1.0, "oz").unwrap(), 28.35));
        assert!(close(mass_to_grams(1.0, "lb").unwrap(), 453.6));
        assert!(close(mass_to_grams(0.25, "kg").unwrap(), 250.0));
        assert!(close(mass_to_grams(240.0, "ml").unwrap(), 240.0));
        assert!(close(mass_to_milligrams(0.4, "g").unwrap(), 400.0));
        assert!(mass_to_grams(1.0, "cup").is_none());
    }

    #[test]
    fn test_per_100g_rescaling() {
        assert!(close(per_100g_to_serving(52.0, 182.0), 94.64));
        assert!(close(per_100g_to_serving(31.0, 100.0), 31.0));
    }
}
