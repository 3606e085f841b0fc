//! Core types for the search domain.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::domain::models::{Field, QuestionRecord};

/// Snapshot of every distinct value currently stored, per field.
///
/// Built fresh for each search so the extractor never sees stale categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryVocabulary {
    values: BTreeMap<Field, BTreeSet<String>>,
}

impl CategoryVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<I, S>(mut self, field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, field: Field, values: BTreeSet<String>) {
        self.values.insert(field, values);
    }

    pub fn get(&self, field: Field) -> Option<&BTreeSet<String>> {
        self.values.get(&field)
    }

    /// True when no field holds a single value, i.e. the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(BTreeSet::is_empty)
    }

    /// All values across fields, deduplicated.
    pub fn flatten(&self) -> Vec<String> {
        self.values
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether `tokens` name every value of `field`.
    ///
    /// Fields with fewer than two values are never considered covered: a lone
    /// value being named is a genuine constraint, not an unconstrained axis.
    pub fn covers(&self, field: Field, tokens: &BTreeSet<String>) -> bool {
        match self.get(field) {
            Some(values) if values.len() > 1 => values.iter().all(|v| tokens.contains(v)),
            _ => false,
        }
    }
}

/// Stable name of a failure, surfaced to callers in a [`SearchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum ErrorKind {
    #[strum(serialize = "InvalidFieldError")]
    #[serde(rename = "InvalidFieldError")]
    InvalidField,
    #[strum(serialize = "StoreUnavailableError")]
    #[serde(rename = "StoreUnavailableError")]
    StoreUnavailable,
    #[strum(serialize = "EmptyQueryError")]
    #[serde(rename = "EmptyQueryError")]
    EmptyQuery,
    #[strum(serialize = "ExternalServiceError")]
    #[serde(rename = "ExternalServiceError")]
    ExternalService,
    #[strum(serialize = "MalformedResponseError")]
    #[serde(rename = "MalformedResponseError")]
    MalformedResponse,
}

/// Progress of a single `search` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Idle,
    Extracting,
    Planning,
    Querying,
    Done,
    Failed(ErrorKind),
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::Idle => write!(f, "idle"),
            SearchStage::Extracting => write!(f, "extracting"),
            SearchStage::Planning => write!(f, "planning"),
            SearchStage::Querying => write!(f, "querying"),
            SearchStage::Done => write!(f, "done"),
            SearchStage::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

/// A matched record and the category tokens that matched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub record: QuestionRecord,
    pub matched: Vec<String>,
}

/// Outcome of a search, always returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub items: Vec<SearchHit>,
    /// Category tokens the extractor produced for the query
    pub categories: Vec<String>,
    /// Set when a dependency failed and the result is empty because of it
    pub degraded: bool,
    pub error_reason: Option<ErrorKind>,
    /// Human-readable summary for the presentation layer
    pub status: String,
}

impl SearchResult {
    pub fn found(items: Vec<SearchHit>, categories: Vec<String>) -> Self {
        let status = match items.len() {
            0 => "No questions matched".to_string(),
            1 => "1 question matched".to_string(),
            n => format!("{n} questions matched"),
        };
        Self {
            items,
            categories,
            degraded: false,
            error_reason: None,
            status,
        }
    }

    pub fn degraded(reason: ErrorKind, status: impl Into<String>) -> Self {
        Self {
            items: vec![],
            categories: vec![],
            degraded: true,
            error_reason: Some(reason),
            status: status.into(),
        }
    }

    pub fn rejected(reason: ErrorKind, status: impl Into<String>) -> Self {
        Self {
            degraded: false,
            ..Self::degraded(reason, status)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.items.iter().map(|hit| &hit.record)
    }
}
