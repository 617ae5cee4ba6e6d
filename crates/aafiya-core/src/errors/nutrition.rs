// ABOUTME: Error types for nutrition lookups, AI estimation, and nutrition record validation
// ABOUTME: Distinguishes not-found (fallback) from rate-limit and outage (transient) failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Failure of an external nutrition source lookup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The source has no data for the item, or returned an empty/all-zero record
    #[error("{source_name} has no nutrition data for '{item}'")]
    NotFound {
        /// Source that was queried
        source_name: String,
        /// Item that was looked up
        item: String,
    },

    /// The source refused the call because of rate limiting
    #[error("{source_name} rate limit exceeded{}", retry_suffix(*.retry_after_secs))]
    RateLimited {
        /// Source that was queried
        source_name: String,
        /// Seconds until the limit resets, when the source reports it
        retry_after_secs: Option<u64>,
    },

    /// Transport failure, timeout, or unexpected response
    #[error("{source_name} unavailable: {reason}")]
    Unavailable {
        /// Source that was queried
        source_name: String,
        /// What went wrong
        reason: String,
    },
}

impl SourceError {
    /// Source has no record for `item`
    pub fn not_found(source_name: impl Into<String>, item: impl Into<String>) -> Self {
        Self::NotFound {
            source_name: source_name.into(),
            item: item.into(),
        }
    }

    /// Source throttled the request
    pub fn rate_limited(source_name: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited {
            source_name: source_name.into(),
            retry_after_secs,
        }
    }

    /// Source could not be reached or answered unexpectedly
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Rate limits and outages may clear on retry; a miss will not
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}

fn retry_suffix(retry_after_secs: Option<u64>) -> String {
    retry_after_secs
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

/// Failure of the AI estimation tier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EstimationError {
    /// The model could not be reached or produced no usable estimate
    #[error("estimation model unavailable: {reason}")]
    ModelUnavailable {
        /// What went wrong
        reason: String,
    },

    /// The input cannot be estimated (empty description, unreadable image, no vision support)
    #[error("cannot estimate nutrition: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },
}

impl EstimationError {
    /// Model failure
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }

    /// Input rejected
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Only model outages are worth retrying
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }
}

/// A nutrition record violated its value constraints
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NutritionDataError {
    /// A nutrient value was negative or not a finite number
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidNutrient {
        /// Offending field
        field: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Serving size must be strictly positive
    #[error("serving size must be positive, got {0} g")]
    InvalidServing(f64),

    /// Quantity multiplier must be strictly positive
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(f64),

    /// Quantity was larger than a single logged meal plausibly holds
    #[error("quantity {value} exceeds the maximum of {max} servings")]
    QuantityTooLarge {
        /// Parsed quantity
        value: f64,
        /// Configured upper bound
        max: f64,
    },

    /// Food name was empty after trimming
    #[error("food name must not be empty")]
    EmptyName,

    /// A meal entry needs at least one food
    #[error("meal entry must contain at least one food item")]
    EmptyMeal,
}
