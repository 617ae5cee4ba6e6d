// ABOUTME: Meal log entry models with derived nutrition totals
// ABOUTME: MealId, MealOrigin, immutable MealEntry, MealDraft, TimeRange, and MealTotals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::nutrition::{FoodFact, Macros};
use crate::errors::NutritionDataError;

/// Session-unique, monotonically increasing meal identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MealId(pub u64);

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "meal-{}", self.0)
    }
}

/// How the meal was captured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealOrigin {
    /// Typed description
    ManualText,
    /// Photo analysis
    ImageAnalysis,
}

/// A meal the user confirmed, not yet assigned an id
#[derive(Debug, Clone)]
pub struct MealDraft {
    /// When the meal was eaten
    pub timestamp: DateTime<Utc>,
    /// User-facing description
    pub description: String,
    /// Resolved foods in the order they were mentioned
    pub items: Vec<FoodFact>,
    /// Capture channel
    pub origin: MealOrigin,
}

impl MealDraft {
    /// Draft a meal eaten now
    pub fn now(description: impl Into<String>, items: Vec<FoodFact>, origin: MealOrigin) -> Self {
        Self {
            timestamp: Utc::now(),
            description: description.into(),
            items,
            origin,
        }
    }

    /// Override the time the meal was eaten
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// One logged meal event
///
/// Entries are immutable once created. `totals` is always the sum of
/// `items` because it is computed at construction and recomputed when an
/// entry is deserialized. A correction is a new entry whose `corrects`
/// field names the entry it supersedes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "MealEntryRecord")]
pub struct MealEntry {
    id: MealId,
    timestamp: DateTime<Utc>,
    description: String,
    items: Vec<FoodFact>,
    totals: Macros,
    origin: MealOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrects: Option<MealId>,
}

impl MealEntry {
    /// Build an entry from a draft
    ///
    /// # Errors
    ///
    /// Returns `NutritionDataError::EmptyMeal` when the draft has no items
    pub fn from_draft(
        id: MealId,
        draft: MealDraft,
        corrects: Option<MealId>,
    ) -> Result<Self, NutritionDataError> {
        if draft.items.is_empty() {
            return Err(NutritionDataError::EmptyMeal);
        }
        let totals = draft.items.iter().map(FoodFact::macros).sum();
        Ok(Self {
            id,
            timestamp: draft.timestamp,
            description: draft.description,
            items: draft.items,
            totals,
            origin: draft.origin,
            corrects,
        })
    }

    /// Entry identifier
    #[must_use]
    pub const fn id(&self) -> MealId {
        self.id
    }

    /// When the meal was eaten
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// User-facing description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Resolved foods
    #[must_use]
    pub fn items(&self) -> &[FoodFact] {
        &self.items
    }

    /// Sum of the items' macros
    #[must_use]
    pub const fn totals(&self) -> Macros {
        self.totals
    }

    /// Capture channel
    #[must_use]
    pub const fn origin(&self) -> MealOrigin {
        self.origin
    }

    /// Entry this one supersedes, if it is a correction
    #[must_use]
    pub const fn corrects(&self) -> Option<MealId> {
        self.corrects
    }
}

#[derive(Debug, Deserialize)]
struct MealEntryRecord {
    id: MealId,
    timestamp: DateTime<Utc>,
    description: String,
    items: Vec<FoodFact>,
    origin: MealOrigin,
    #[serde(default)]
    corrects: Option<MealId>,
}

impl TryFrom<MealEntryRecord> for MealEntry {
    type Error = NutritionDataError;

    fn try_from(record: MealEntryRecord) -> Result<Self, Self::Error> {
        let draft = MealDraft {
            timestamp: record.timestamp,
            description: record.description,
            items: record.items,
            origin: record.origin,
        };
        Self::from_draft(record.id, draft, record.corrects)
    }
}

/// Half-open time interval `[start, end)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range; a reversed range is empty rather than an error
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Range covering every representable timestamp
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// The `days` days ending at `end`, clamped at the earliest representable time
    #[must_use]
    pub fn days_ending(end: DateTime<Utc>, days: u32) -> Self {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    /// Whether `timestamp` falls inside the range
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// Aggregated nutrition over a set of meal entries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MealTotals {
    /// Summed macros
    pub macros: Macros,
    /// Entries that contributed
    pub entry_count: usize,
}
