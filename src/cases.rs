//! Case store — paired fluoroscopy/CT case records loaded from CSV.
//!
//! DESIGN
//! ======
//! The table is read once at startup and never mutated. Filtering borrows
//! records into a `CaseView`; selection from a view uses the first record
//! for a diagnosis when the table repeats one (first occurrence wins).

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Separator between tags in the `tags` column.
pub const TAG_SEPARATOR: &str = ", ";

// =============================================================================
// RECORD
// =============================================================================

/// One row of the case table. Missing columns and empty cells are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseRecord {
    pub diagnosis: String,
    pub tags: String,
    pub age: String,
    pub gender: String,
    pub image: String,
    pub image_ct: String,
    pub description: String,
    pub description_ct: String,
    pub url: String,
    pub url_ct: String,
}

impl CaseRecord {
    /// Individual tags, in file order, split on `", "` exactly. Empty segments are dropped.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(TAG_SEPARATOR).filter(|t| !t.is_empty())
    }

    /// Lower-cased `column value` lines covering every field, used by free-text search.
    #[must_use]
    pub fn haystack(&self) -> String {
        let fields = [
            ("diagnosis", &self.diagnosis),
            ("tags", &self.tags),
            ("age", &self.age),
            ("gender", &self.gender),
            ("image", &self.image),
            ("image_ct", &self.image_ct),
            ("description", &self.description),
            ("description_ct", &self.description_ct),
            ("url", &self.url),
            ("url_ct", &self.url_ct),
        ];
        let mut out = String::new();
        for (name, value) in fields {
            let _ = writeln!(out, "{name} {value}");
        }
        out.to_lowercase()
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CaseStoreError {
    #[error("failed to open case table {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("failed to parse case table {}: {source}", path.display())]
    Parse { path: PathBuf, source: csv::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("No cases match your filter/search.")]
    NoMatches,

    #[error("diagnosis not in current results: {0}")]
    UnknownDiagnosis(String),
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CaseStore {
    records: Vec<CaseRecord>,
}

impl CaseStore {
    /// Load every row of the CSV at `path`. The header row is required.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or a row fails to parse.
    pub fn load(path: &Path) -> Result<Self, CaseStoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| CaseStoreError::Open { path: path.to_path_buf(), source })?;

        let mut records = Vec::new();
        for row in reader.deserialize::<CaseRecord>() {
            let record = row.map_err(|source| CaseStoreError::Parse { path: path.to_path_buf(), source })?;
            records.push(record);
        }

        tracing::debug!(path = %path.display(), count = records.len(), "case table loaded");
        Ok(Self { records })
    }

    #[must_use]
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, unfiltered.
    #[must_use]
    pub fn view(&self) -> CaseView<'_> {
        CaseView { records: self.records.iter().collect() }
    }

    /// Sorted, de-duplicated tags across the whole table.
    #[must_use]
    pub fn tag_options(&self) -> Vec<String> {
        let tags: BTreeSet<&str> = self.records.iter().flat_map(CaseRecord::tag_list).collect();
        tags.into_iter().map(str::to_string).collect()
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// A filtered, order-preserving subset of the store.
#[derive(Debug, Clone)]
pub struct CaseView<'a> {
    records: Vec<&'a CaseRecord>,
}

impl<'a> CaseView<'a> {
    pub(crate) fn new(records: Vec<&'a CaseRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[&'a CaseRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique diagnoses in first-occurrence order.
    #[must_use]
    pub fn diagnoses(&self) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.diagnosis.as_str())
            .filter(|d| seen.insert(*d))
            .collect()
    }

    /// Pick the record for `diagnosis`, or the first record when `None`.
    ///
    /// # Errors
    ///
    /// [`SelectError::NoMatches`] when the view is empty, so callers stop
    /// before indexing into nothing; [`SelectError::UnknownDiagnosis`] when
    /// the diagnosis is not in this view.
    pub fn select(&self, diagnosis: Option<&str>) -> Result<&'a CaseRecord, SelectError> {
        let first = self.records.first().ok_or(SelectError::NoMatches)?;
        let Some(wanted) = diagnosis else {
            return Ok(first);
        };
        self.records
            .iter()
            .find(|r| r.diagnosis == wanted)
            .copied()
            .ok_or_else(|| SelectError::UnknownDiagnosis(wanted.to_string()))
    }
}

#[cfg(test)]
#[path = "cases_test.rs"]
mod tests;
