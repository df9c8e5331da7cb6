//! Filter engine — narrows the case store by user-selected criteria.
//!
//! All active criteria are ANDed together. An empty criterion (no tags,
//! blank query, no age range, no genders) does not filter at all.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cases::{CaseRecord, CaseStore, CaseView};

pub const GENDER_OPTIONS: [&str; 2] = ["Male", "Female"];
pub const AGE_MIN: u32 = 0;
pub const AGE_MAX: u32 = 100;

static AGE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("static regex"));

// =============================================================================
// CRITERIA
// =============================================================================

/// Inclusive age bounds, always within `AGE_MIN..=AGE_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub const FULL: Self = Self { min: AGE_MIN, max: AGE_MAX };

    /// Clamp to the slider domain and put the bounds in order.
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        let a = min.clamp(AGE_MIN, AGE_MAX);
        let b = max.clamp(AGE_MIN, AGE_MAX);
        Self { min: a.min(b), max: a.max(b) }
    }

    #[must_use]
    pub fn contains(&self, age: u32) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub tags: Vec<String>,
    pub query: String,
    pub age: Option<AgeRange>,
    pub genders: Vec<String>,
}

impl FilterCriteria {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.query.trim().is_empty() && self.age.is_none() && self.genders.is_empty()
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Numeric portion of a free-text age ("45 years" -> 45). `None` if there is none.
#[must_use]
pub fn extract_age(raw: &str) -> Option<u32> {
    AGE_DIGITS.find(raw).and_then(|m| m.as_str().parse().ok())
}

/// Any selected tag occurs in the record's tag field.
fn matches_tags(record: &CaseRecord, tags: &[String]) -> bool {
    tags.iter().any(|tag| record.tags.contains(tag.as_str()))
}

fn matches_query(record: &CaseRecord, needle_lower: &str) -> bool {
    record.haystack().contains(needle_lower)
}

/// Unparseable ages never match a range.
fn matches_age(record: &CaseRecord, range: AgeRange) -> bool {
    extract_age(&record.age).is_some_and(|age| range.contains(age))
}

fn matches_gender(record: &CaseRecord, genders: &[String]) -> bool {
    genders.iter().any(|g| *g == record.gender)
}

// =============================================================================
// APPLY
// =============================================================================

/// Records satisfying every active criterion, in store order.
#[must_use]
pub fn apply<'a>(store: &'a CaseStore, criteria: &FilterCriteria) -> CaseView<'a> {
    if criteria.is_empty() {
        return store.view();
    }

    let mut records: Vec<&CaseRecord> = store.records().iter().collect();

    if !criteria.tags.is_empty() {
        records.retain(|r| matches_tags(r, &criteria.tags));
    }

    let query = criteria.query.trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        records.retain(|r| matches_query(r, &needle));
    }

    if let Some(range) = criteria.age {
        records.retain(|r| matches_age(r, range));
    }

    if !criteria.genders.is_empty() {
        records.retain(|r| matches_gender(r, &criteria.genders));
    }

    if records.is_empty() && !store.is_empty() {
        tracing::warn!(?criteria, "filter produced no matches");
    }

    CaseView::new(records)
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
