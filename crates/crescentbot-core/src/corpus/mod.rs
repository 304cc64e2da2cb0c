//! Question/Answer Corpus
//!
//! The corpus is a read-only sequence of question/answer records loaded once
//! per session from a JSON file. Entry identity is position in the sequence;
//! entries are never mutated after load. Records missing a question or an
//! answer are skipped at load time without failing the rest of the load.

mod category;

pub use category::{extract_category, CategoryMap, UNKNOWN_CATEGORY};

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Corpus loading error.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// File could not be read.
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),
    /// File is not a JSON array of records.
    #[error("failed to parse corpus JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// ENTRIES
// ============================================================================

/// A single immutable question/answer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// The reference question.
    pub question: String,
    /// The canonical answer.
    pub answer: String,
    /// Optional classification attributes (free-text labels).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
}

/// Raw record shape as it appears on disk; blank strings are treated as
/// absent attributes.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    level: String,
    #[serde(default)]
    semester: String,
    #[serde(default)]
    faculty: String,
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// The classification fields a corpus subset can be constrained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Faculty,
    Department,
    Level,
    Semester,
}

/// A conjunction of set-membership constraints over the classification
/// fields. An empty selection for a field means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub faculty: HashSet<String>,
    pub department: HashSet<String>,
    pub level: HashSet<String>,
    pub semester: HashSet<String>,
}

impl FilterCriteria {
    /// True when no field is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.faculty.is_empty()
            && self.department.is_empty()
            && self.level.is_empty()
            && self.semester.is_empty()
    }

    /// Whether `entry` satisfies every constrained field.
    pub fn matches(&self, entry: &CorpusEntry) -> bool {
        field_matches(&self.faculty, entry.faculty.as_deref())
            && field_matches(&self.department, entry.department.as_deref())
            && field_matches(&self.level, entry.level.as_deref())
            && field_matches(&self.semester, entry.semester.as_deref())
    }
}

fn field_matches(selected: &HashSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.contains(v))
}

// ============================================================================
// CORPUS
// ============================================================================

/// The loaded, read-only corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Build a corpus from already-validated entries.
    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// Load a corpus from a JSON file, skipping malformed records.
    pub fn load_json(path: &Path) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parse a corpus from a JSON array string, skipping malformed records.
    pub fn from_json_str(raw: &str) -> Result<Self, CorpusError> {
        let records: Vec<RawEntry> = serde_json::from_str(raw)?;
        let total = records.len();

        let entries: Vec<CorpusEntry> = records
            .into_iter()
            .filter_map(|r| {
                let question = non_blank(r.question)?;
                let answer = non_blank(r.answer)?;
                Some(CorpusEntry {
                    question,
                    answer,
                    department: non_blank(r.department),
                    level: non_blank(r.level),
                    semester: non_blank(r.semester),
                    faculty: non_blank(r.faculty),
                })
            })
            .collect();

        if entries.len() < total {
            tracing::debug!(
                skipped = total - entries.len(),
                kept = entries.len(),
                "skipped corpus records without question or answer"
            );
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&CorpusEntry> {
        self.entries.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusEntry> {
        self.entries.iter()
    }

    /// Positions of the entries satisfying `criteria`, in corpus order.
    /// An empty result is a valid state, not an error.
    pub fn apply_filters(&self, criteria: &FilterCriteria) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| criteria.matches(e))
            .map(|(i, _)| i)
            .collect()
    }

    /// Distinct values present for a classification field, sorted.
    /// This is the source for filter selection surfaces.
    pub fn distinct_values(&self, field: FilterField) -> Vec<String> {
        let values: BTreeSet<String> = self
            .entries
            .iter()
            .filter_map(|e| match field {
                FilterField::Faculty => e.faculty.clone(),
                FilterField::Department => e.department.clone(),
                FilterField::Level => e.level.clone(),
                FilterField::Semester => e.semester.clone(),
            })
            .collect();
        values.into_iter().collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
