//! Mock store implementation for testing.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::models::{Field, QuestionRecord};
use crate::domain::search::planner::Predicate;
use crate::domain::search::traits::{MetadataStore, Result, SearchError};

/// In-memory store that evaluates predicates clause by clause.
///
/// Like a naive union query, a record is returned once per clause it
/// matches, so callers must deduplicate.
#[derive(Clone, Default)]
pub struct MockMetadataStore {
    records: Arc<RwLock<Vec<QuestionRecord>>>,
    /// When set, every call fails with `StoreUnavailable`
    failure: Arc<RwLock<Option<String>>>,
    query_count: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, records: Vec<QuestionRecord>) -> Self {
        self.records.write().unwrap().extend(records);
        self
    }

    /// Make every subsequent call fail.
    pub fn failing(self, message: &str) -> Self {
        *self.failure.write().unwrap() = Some(message.to_string());
        self
    }

    /// Simulate an ingestion run between searches.
    pub fn insert(&self, record: QuestionRecord) {
        self.records.write().unwrap().push(record);
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(SearchError::StoreUnavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn distinct_values(&self, field: Field) -> Result<BTreeSet<String>> {
        self.check_available()?;
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .flat_map(|record| record.values(field))
            .filter(|value| !value.trim().is_empty())
            .collect())
    }

    async fn query(&self, predicate: &Predicate) -> Result<Vec<QuestionRecord>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut records = self.records.read().unwrap().clone();
        records.sort_by(|a, b| a.question_id.cmp(&b.question_id));

        Ok(records
            .iter()
            .flat_map(|record| {
                predicate
                    .clauses()
                    .iter()
                    .filter(|clause| clause.matches(record))
                    .map(|_| record.clone())
                    .collect::<Vec<_>>()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Difficulty;

    fn make_record(id: &str, year: i32, topic: &str) -> QuestionRecord {
        QuestionRecord {
            question_id: id.to_string(),
            year,
            paper: "Paper 1".to_string(),
            question_number: "Question 1".to_string(),
            topics: [topic.to_string()].into(),
            module: String::new(),
            difficulty: Difficulty::Unknown,
        }
    }

    #[tokio::test]
    async fn distinct_values_skip_empty() {
        let store = MockMetadataStore::new().with_records(vec![
            make_record("y2022p1q1", 2022, "Graphs"),
            make_record("y2023p1q1", 2023, "Graphs"),
        ]);

        let years = store.distinct_values(Field::Year).await.unwrap();
        assert_eq!(years.len(), 2);
        assert!(store.distinct_values(Field::Module).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_field_name_is_rejected() {
        let store = MockMetadataStore::new();
        let err = store.distinct_values_by_name("Author").await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidField(name) if name == "Author"));
        assert!(store.distinct_values_by_name("Topics").await.is_ok());
    }

    #[tokio::test]
    async fn failing_store_reports_unavailable() {
        let store = MockMetadataStore::new().failing("disk gone");
        assert!(matches!(
            store.vocabulary().await,
            Err(SearchError::StoreUnavailable(_))
        ));
    }
}
