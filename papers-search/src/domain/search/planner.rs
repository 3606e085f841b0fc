//! Turns extracted category tokens into a store predicate and runs it.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use itertools::Itertools;
use past_papers::label_number;
use tracing::debug;

use super::traits::{MetadataStore, Result};
use super::types::CategoryVocabulary;
use crate::domain::models::{Field, QuestionRecord};

/// A single condition on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// The field's value equals `value`, ignoring surrounding whitespace.
    /// Difficulty labels also ignore case.
    Equals { field: Field, value: String },
    /// `needle` occurs in one of the field's values, ignoring case.
    Contains { field: Field, needle: String },
}

impl Clause {
    pub fn field(&self) -> Field {
        match self {
            Clause::Equals { field, .. } | Clause::Contains { field, .. } => *field,
        }
    }

    /// The category token this clause was built from.
    pub fn token(&self) -> &str {
        match self {
            Clause::Equals { value, .. } => value,
            Clause::Contains { needle, .. } => needle,
        }
    }

    pub fn matches(&self, record: &QuestionRecord) -> bool {
        match self {
            Clause::Equals { field, value } => record.values(*field).iter().any(|v| {
                let v = v.trim();
                if *field == Field::Difficulty {
                    v.eq_ignore_ascii_case(value)
                } else {
                    v == value
                }
            }),
            Clause::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                record
                    .values(*field)
                    .iter()
                    .any(|v| v.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Disjunction of clauses. An empty predicate matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches_nothing(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, record: &QuestionRecord) -> bool {
        self.clauses.iter().any(|clause| clause.matches(record))
    }

    /// Tokens of every clause matching `record`, deduplicated in clause order.
    pub fn matched_tokens(&self, record: &QuestionRecord) -> Vec<String> {
        self.clauses
            .iter()
            .filter(|clause| clause.matches(record))
            .map(|clause| clause.token().to_string())
            .unique()
            .collect()
    }

    pub fn fields(&self) -> BTreeSet<Field> {
        self.clauses.iter().map(Clause::field).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Build a predicate matching records where any token equals the Year,
    /// Paper, QuestionNumber or Difficulty, or occurs in a topic or the module.
    ///
    /// A field whose whole vocabulary is named by the tokens gets no clauses:
    /// the query did not constrain that axis.
    pub fn plan(
        &self,
        categories: &BTreeSet<String>,
        vocabulary: &CategoryVocabulary,
    ) -> Predicate {
        let tokens: BTreeSet<String> = categories
            .iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect();

        if tokens.is_empty() {
            return Predicate::nothing();
        }

        let (dropped, kept): (Vec<Field>, Vec<Field>) = Field::ALL
            .into_iter()
            .partition(|field| vocabulary.covers(*field, &tokens));

        if !dropped.is_empty() {
            debug!(?dropped, "Dropping fields covered by the whole vocabulary");
        }

        let clauses = tokens
            .iter()
            .flat_map(|token| {
                kept.iter().map(move |&field| {
                    if field.is_free_text() {
                        Clause::Contains {
                            field,
                            needle: token.clone(),
                        }
                    } else {
                        Clause::Equals {
                            field,
                            value: token.clone(),
                        }
                    }
                })
            })
            .collect();

        Predicate::from_clauses(clauses)
    }

    /// Run `predicate` against `store`, deduplicating by question id (first
    /// occurrence wins) and ordering newest year first, then paper, then
    /// question.
    pub async fn execute<S>(&self, predicate: &Predicate, store: &S) -> Result<Vec<QuestionRecord>>
    where
        S: MetadataStore + ?Sized,
    {
        if predicate.matches_nothing() {
            return Ok(vec![]);
        }

        let rows = store.query(predicate).await?;
        let fetched = rows.len();

        let mut records: Vec<QuestionRecord> = rows
            .into_iter()
            .unique_by(|record| record.question_id.clone())
            .collect();
        records.sort_by(presentation_order);

        debug!(fetched, unique = records.len(), "Executed search predicate");
        Ok(records)
    }
}

fn presentation_order(a: &QuestionRecord, b: &QuestionRecord) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| compare_labels(&a.paper, &b.paper))
        .then_with(|| compare_labels(&a.question_number, &b.question_number))
        .then_with(|| a.question_id.cmp(&b.question_id))
}

/// "Question 2" sorts before "Question 10".
fn compare_labels(a: &str, b: &str) -> Ordering {
    match (label_number(a), label_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}
