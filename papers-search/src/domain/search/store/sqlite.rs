//! SQLite-backed question store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::config::StoreSettings;
use crate::domain::models::{split_topics, Difficulty, Field, QuestionRecord};
use crate::domain::search::planner::{Clause, Predicate};
use crate::domain::search::traits::{MetadataStore, Result, SearchError};

/// Columns are cast so tables with loosely typed columns (a TEXT year, an
/// INTEGER paper number) still decode.
const SELECT_QUESTIONS: &str = "\
SELECT CAST(QuestionID AS TEXT) AS QuestionID, \
CAST(Year AS INTEGER) AS Year, \
CAST(Paper AS TEXT) AS Paper, \
CAST(QuestionNumber AS TEXT) AS QuestionNumber, \
CAST(Topics AS TEXT) AS Topics, \
CAST(Module AS TEXT) AS Module, \
CAST(Difficulty AS TEXT) AS Difficulty \
FROM questions";

/// Read-only view of the `questions` table.
///
/// The pool synchronizes access to its connections, so one store may be
/// shared between worker tasks.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Open the catalogue described by `settings`.
    ///
    /// Connections are established on first use, so a missing or unreadable
    /// file surfaces as `StoreUnavailable` from the first query.
    pub fn open(settings: &StoreSettings) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout())
            .connect_lazy_with(settings.connect_options());
        Self { pool }
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    #[sqlx(rename = "QuestionID")]
    question_id: String,
    #[sqlx(rename = "Year")]
    year: Option<i64>,
    #[sqlx(rename = "Paper")]
    paper: Option<String>,
    #[sqlx(rename = "QuestionNumber")]
    question_number: Option<String>,
    #[sqlx(rename = "Topics")]
    topics: Option<String>,
    #[sqlx(rename = "Module")]
    module: Option<String>,
    #[sqlx(rename = "Difficulty")]
    difficulty: Option<String>,
}

impl TryFrom<QuestionRow> for QuestionRecord {
    type Error = SearchError;

    fn try_from(row: QuestionRow) -> Result<Self> {
        let year = row
            .year
            .and_then(|year| i32::try_from(year).ok())
            .ok_or_else(|| {
                SearchError::StoreUnavailable(format!(
                    "{} has no usable year: {:?}",
                    row.question_id, row.year
                ))
            })?;

        Ok(QuestionRecord {
            question_id: row.question_id,
            year,
            paper: row.paper.unwrap_or_default(),
            question_number: row.question_number.unwrap_or_default(),
            topics: split_topics(row.topics.as_deref().unwrap_or_default()),
            module: row.module.unwrap_or_default(),
            difficulty: Difficulty::from_label(row.difficulty.as_deref().unwrap_or_default()),
        })
    }
}

/// Column expression compared against category tokens, always TEXT.
fn column_expr(field: Field) -> &'static str {
    match field {
        Field::Year => "CAST(CAST(Year AS INTEGER) AS TEXT)",
        Field::Paper => "CAST(Paper AS TEXT)",
        Field::QuestionNumber => "CAST(QuestionNumber AS TEXT)",
        Field::Topics => "CAST(Topics AS TEXT)",
        Field::Module => "CAST(Module AS TEXT)",
        Field::Difficulty => "CAST(Difficulty AS TEXT)",
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Sqlite>, clause: &Clause) {
    match clause {
        Clause::Equals {
            field: Field::Difficulty,
            value,
        } => {
            builder.push("lower(trim(");
            builder.push(column_expr(Field::Difficulty));
            builder.push(")) = lower(");
            builder.push_bind(value.clone());
            builder.push(")");
        }
        Clause::Equals { field, value } => {
            builder.push("trim(");
            builder.push(column_expr(*field));
            builder.push(") = ");
            builder.push_bind(value.clone());
        }
        // SQLite's lower() only folds ASCII, so non-ASCII needles select
        // candidates here and are decided by `Predicate::matches`.
        Clause::Contains { field, needle } if needle.is_ascii() => {
            builder.push("instr(lower(");
            builder.push(column_expr(*field));
            builder.push("), lower(");
            builder.push_bind(needle.clone());
            builder.push(")) > 0");
        }
        Clause::Contains { field, .. } => {
            builder.push(column_expr(*field));
            builder.push(" IS NOT NULL");
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    #[tracing::instrument(skip(self))]
    async fn distinct_values(&self, field: Field) -> Result<BTreeSet<String>> {
        let column = column_expr(field);
        let sql = format!("SELECT DISTINCT {column} FROM questions WHERE {column} IS NOT NULL");
        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let values = rows.into_iter().map(|(value,)| value);
        let values: BTreeSet<String> = if field == Field::Topics {
            values.flat_map(|column| split_topics(&column)).collect()
        } else if field == Field::Difficulty {
            values
                .map(|label| Difficulty::from_label(&label).to_string())
                .collect()
        } else {
            values
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect()
        };

        Ok(values)
    }

    #[tracing::instrument(skip_all, fields(clauses = predicate.clauses().len()))]
    async fn query(&self, predicate: &Predicate) -> Result<Vec<QuestionRecord>> {
        if predicate.matches_nothing() {
            return Ok(vec![]);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
        builder.push(" WHERE ");
        for (i, clause) in predicate.clauses().iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("(");
            push_clause(&mut builder, clause);
            builder.push(")");
        }
        builder.push(" ORDER BY QuestionID");

        let rows: Vec<QuestionRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        let records = rows
            .into_iter()
            .map(QuestionRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        // The SQL filter sees Topics as one joined column; keep only rows a
        // clause matches topic by topic.
        Ok(records
            .into_iter()
            .filter(|record| predicate.matches(record))
            .collect())
    }
}
