//! Trait definitions for search domain abstractions.
//!
//! These traits enable dependency injection and easy testing through mocking.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;

use super::planner::Predicate;
use super::types::{CategoryVocabulary, ErrorKind};
use crate::domain::models::{Field, QuestionRecord};

/// Error type for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Unknown field: {0}")]
    InvalidField(String),

    #[error("Question store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Search query is empty")]
    EmptyQuery,

    #[error("Classification service failed: {0}")]
    ExternalService(String),

    #[error("Classification response is not a list: {0}")]
    MalformedResponse(String),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::InvalidField(_) => ErrorKind::InvalidField,
            SearchError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            SearchError::EmptyQuery => ErrorKind::EmptyQuery,
            SearchError::ExternalService(_) => ErrorKind::ExternalService,
            SearchError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Read-only access to catalogued questions.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All distinct non-empty values stored for `field`.
    ///
    /// For `Topics` each topic is reported individually.
    async fn distinct_values(&self, field: Field) -> Result<BTreeSet<String>>;

    /// Records matching `predicate`, ordered by question id.
    async fn query(&self, predicate: &Predicate) -> Result<Vec<QuestionRecord>>;

    /// Like [`MetadataStore::distinct_values`], addressed by column name.
    async fn distinct_values_by_name(&self, field: &str) -> Result<BTreeSet<String>> {
        let field =
            Field::from_str(field).map_err(|_| SearchError::InvalidField(field.to_string()))?;
        self.distinct_values(field).await
    }

    /// Distinct values of every field, read now.
    async fn vocabulary(&self) -> Result<CategoryVocabulary> {
        let mut vocabulary = CategoryVocabulary::new();
        for field in Field::ALL {
            vocabulary.insert(field, self.distinct_values(field).await?);
        }
        Ok(vocabulary)
    }
}

/// Maps a free-text query onto category tokens.
///
/// Implementations must reject blank queries and skip the external call
/// entirely when the vocabulary is empty.
#[async_trait]
pub trait CategoryExtractor: Send + Sync {
    async fn extract(
        &self,
        query: &str,
        vocabulary: &CategoryVocabulary,
    ) -> Result<BTreeSet<String>>;
}
