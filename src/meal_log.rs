// ABOUTME: Append-only session meal log with corrections and aggregates derived on read
// ABOUTME: Range queries, totals, daily breakdowns, and rolling averages over logged meals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Meal Log
//!
//! Appending is the only mutation. A correction is a new entry that names
//! the entry it supersedes; the original stays in history and in `query`
//! results but is left out of aggregates so the corrected meal is not
//! counted twice. Aggregates are computed from the entries on every call.

use std::collections::{BTreeMap, HashSet};

use aafiya_core::errors::{AppError, AppResult};
use aafiya_core::models::{Macros, MealDraft, MealEntry, MealId, MealTotals, TimeRange};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::logging::EngineLogger;

/// Ordered sequence of meals for one session
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MealLog {
    entries: Vec<MealEntry>,
    #[serde(skip)]
    last_id: u64,
}

impl MealLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted entries
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for duplicate ids or a correction that names an
    /// entry appended after it
    pub fn from_entries(mut entries: Vec<MealEntry>) -> AppResult<Self> {
        entries.sort_by_key(MealEntry::id);
        let mut seen = HashSet::new();
        for entry in &entries {
            if let Some(target) = entry.corrects() {
                if !seen.contains(&target) {
                    return Err(AppError::invalid_input(format!(
                        "{} corrects unknown or later entry {target}",
                        entry.id()
                    )));
                }
            }
            if !seen.insert(entry.id()) {
                return Err(AppError::invalid_input(format!("duplicate meal id {}", entry.id())));
            }
        }
        let last_id = entries.last().map_or(0, |e| e.id().0);
        Ok(Self { entries, last_id })
    }

    /// Append a confirmed meal
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` when the draft has no items; nothing is appended
    pub fn append(&mut self, draft: MealDraft) -> AppResult<&MealEntry> {
        self.push(draft, None)
    }

    /// Append a meal that supersedes an earlier entry
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when `corrects` is not in the log, or
    /// `ValueOutOfRange` when the draft has no items
    pub fn append_correction(
        &mut self,
        corrects: MealId,
        draft: MealDraft,
    ) -> AppResult<&MealEntry> {
        if self.get(corrects).is_none() {
            return Err(AppError::not_found(corrects.to_string()));
        }
        self.push(draft, Some(corrects))
    }

    fn push(&mut self, draft: MealDraft, corrects: Option<MealId>) -> AppResult<&MealEntry> {
        let id = MealId(self.last_id + 1);
        let entry = MealEntry::from_draft(id, draft, corrects)?;
        EngineLogger::log_meal_appended(id, entry.items().len(), entry.totals().calories, corrects);
        self.last_id = id.0;
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Entry by id
    #[must_use]
    pub fn get(&self, id: MealId) -> Option<&MealEntry> {
        self.entries
            .binary_search_by_key(&id, MealEntry::id)
            .ok()
            .map(|index| &self.entries[index])
    }

    /// All entries in append order
    #[must_use]
    pub fn entries(&self) -> &[MealEntry] {
        &self.entries
    }

    /// Number of entries, superseded ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries inside `range`, ordered by timestamp then id
    #[must_use]
    pub fn query(&self, range: TimeRange) -> Vec<&MealEntry> {
        let mut found: Vec<&MealEntry> = self
            .entries
            .iter()
            .filter(|e| range.contains(e.timestamp()))
            .collect();
        found.sort_by_key(|e| (e.timestamp(), e.id()));
        found
    }

    /// Ids of entries replaced by a later correction
    #[must_use]
    pub fn superseded(&self) -> HashSet<MealId> {
        self.entries.iter().filter_map(MealEntry::corrects).collect()
    }

    fn effective(&self, range: TimeRange) -> impl Iterator<Item = &MealEntry> {
        let superseded = self.superseded();
        self.entries
            .iter()
            .filter(move |e| range.contains(e.timestamp()) && !superseded.contains(&e.id()))
    }

    /// Summed macros over effective entries in `range`; zero for an empty range
    #[must_use]
    pub fn aggregate(&self, range: TimeRange) -> MealTotals {
        self.effective(range).fold(MealTotals::default(), |mut totals, entry| {
            totals.macros += entry.totals();
            totals.entry_count += 1;
            totals
        })
    }

    /// Totals per UTC calendar day, for days with at least one entry
    #[must_use]
    pub fn daily_totals(&self, range: TimeRange) -> BTreeMap<NaiveDate, MealTotals> {
        let mut days: BTreeMap<NaiveDate, MealTotals> = BTreeMap::new();
        for entry in self.effective(range) {
            let day = days.entry(entry.timestamp().date_naive()).or_default();
            day.macros += entry.totals();
            day.entry_count += 1;
        }
        days
    }

    /// Average daily intake over the `days` days ending at `end`
    ///
    /// Days without entries count as zero intake.
    #[must_use]
    pub fn rolling_average(&self, end: DateTime<Utc>, days: u32) -> Macros {
        if days == 0 {
            return Macros::ZERO;
        }
        self.aggregate(TimeRange::days_ending(end, days)).macros.scale(1.0 / f64::from(days))
    }

    /// The `count` most recent effective entries, newest first
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<&MealEntry> {
        self.recent_within(TimeRange::all(), count)
    }

    /// The `count` most recent effective entries inside `range`, newest first
    #[must_use]
    pub fn recent_within(&self, range: TimeRange, count: usize) -> Vec<&MealEntry> {
        let mut effective: Vec<&MealEntry> = self.effective(range).collect();
        effective.sort_by_key(|e| (e.timestamp(), e.id()));
        effective.into_iter().rev().take(count).collect()
    }
}

#[cfg(test)]
mod tests {
    use aafiya_core::models::{FactSource, FoodFact, MealOrigin, NutritionFacts};
    use chrono::TimeZone;

    use super::*;

    fn draft(calories: f64, hour: u32) -> MealDraft {
        let facts = NutritionFacts::new("apple", 182.0, Macros::new(calories, 0.5, 25.0, 0.3));
        let fact = FoodFact::new(facts, FactSource::LocalCatalog).unwrap();
        MealDraft::now("apple", vec![fact], MealOrigin::ManualText)
            .at(Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut log = MealLog::new();
        let first = log.append(draft(95.0, 8)).unwrap().id();
        let second = log.append(draft(95.0, 12)).unwrap().id();
        assert!(second > first);
        assert_eq!(log.get(first).unwrap().id(), first);
    }

    #[test]
    fn test_from_entries_rejects_dangling_correction() {
        let mut log = MealLog::new();
        let id = log.append(draft(95.0, 8)).unwrap().id();
        log.append_correction(id, draft(50.0, 8)).unwrap();
        let mut entries = log.entries().to_vec();
        entries.remove(0);
        assert!(MealLog::from_entries(entries).is_err());
    }
}
