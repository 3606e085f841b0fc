//! Populating the question catalogue.
//!
//! The search core only reads the `questions` table; this module owns its
//! schema and writes rows on behalf of ingestion jobs.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use past_papers::{paper_label, question_label, ArchiveUrl, QuestionId, QuestionIdError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};
use url::Url;

use crate::domain::models::{Difficulty, QuestionRecord};
use crate::domain::search::extractor::ChatModel;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    QuestionId(#[from] QuestionIdError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Archive link error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Topic tagging failed: {0}")]
    Tagging(String),
}

/// Raw facts about a question before it is catalogued.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    /// Archive identifier, e.g. `y2022p2q10`
    pub id: String,
    /// Median mark candidates scored
    pub median: u32,
    pub module: String,
    pub topics: BTreeSet<String>,
}

impl QuestionDraft {
    pub fn into_record(self) -> Result<QuestionRecord, IngestError> {
        let id = QuestionId::parse(&self.id)?;

        Ok(QuestionRecord {
            question_id: id.to_string(),
            year: i32::from(id.year),
            paper: paper_label(id.paper),
            question_number: question_label(id.question),
            topics: self.topics,
            module: self.module,
            difficulty: Difficulty::from_median(self.median),
        })
    }
}

/// Suggests a topic for a question from its PDF.
#[async_trait]
pub trait TopicTagger: Send + Sync {
    async fn tag(&self, question_pdf: &Url) -> Result<String, IngestError>;
}

const TAGGER_PROMPT: &str = "\
You are an expert Cambridge Computer Science examiner.
Classify past paper questions into precise first-year subtopics.
Always choose the most specific topic that fits the question.
Example valid outputs: \"Automaton Theory\", \"Turing Machines\", \"Complexity Theory\".
You are given a link to the question PDF. Respond with the subtopic only.";

/// Topic tagger that asks a chat model for the most specific subtopic.
pub struct ModelTopicTagger<C>
where
    C: ChatModel,
{
    model: C,
}

impl<C> ModelTopicTagger<C>
where
    C: ChatModel,
{
    pub fn new(model: C) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<C> TopicTagger for ModelTopicTagger<C>
where
    C: ChatModel,
{
    async fn tag(&self, question_pdf: &Url) -> Result<String, IngestError> {
        let reply = self
            .model
            .complete(TAGGER_PROMPT, question_pdf.as_str())
            .await
            .map_err(|e| IngestError::Tagging(e.to_string()))?;

        let topic = reply.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
        if topic.is_empty() || topic.contains('\n') {
            return Err(IngestError::Tagging(format!(
                "expected a single topic, got {reply:?}"
            )));
        }

        Ok(topic.to_string())
    }
}

/// Writes rows into the `questions` table.
#[derive(Clone)]
pub struct CatalogueWriter {
    pool: SqlitePool,
}

impl CatalogueWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the catalogue file at `path`.
    pub async fn connect(path: &Path) -> Result<Self, IngestError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                QuestionID TEXT PRIMARY KEY,
                Year INTEGER NOT NULL,
                Paper TEXT NOT NULL,
                QuestionNumber TEXT NOT NULL,
                Topics TEXT NOT NULL DEFAULT '',
                Module TEXT NOT NULL DEFAULT '',
                Difficulty TEXT NOT NULL DEFAULT 'Unknown'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert `record`, replacing any row with the same question id.
    pub async fn upsert(&self, record: &QuestionRecord) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO questions (QuestionID, Year, Paper, QuestionNumber, Topics, Module, Difficulty)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(QuestionID) DO UPDATE
            SET Year = excluded.Year,
                Paper = excluded.Paper,
                QuestionNumber = excluded.QuestionNumber,
                Topics = excluded.Topics,
                Module = excluded.Module,
                Difficulty = excluded.Difficulty
            "#,
        )
        .bind(&record.question_id)
        .bind(record.year)
        .bind(&record.paper)
        .bind(&record.question_number)
        .bind(record.topics_column())
        .bind(&record.module)
        .bind(record.difficulty.to_string())
        .execute(&self.pool)
        .await?;

        debug!(question_id = %record.question_id, "Catalogued question");
        Ok(())
    }

    /// Catalogue `draft`, asking `tagger` for a topic when it has none.
    pub async fn ingest<T>(
        &self,
        draft: QuestionDraft,
        tagger: &T,
        archive: &ArchiveUrl,
    ) -> Result<QuestionRecord, IngestError>
    where
        T: TopicTagger + ?Sized,
    {
        let mut record = draft.into_record()?;

        if record.topics.is_empty() {
            let id = QuestionId::parse(&record.question_id)?;
            let topic = tagger.tag(&archive.for_id(&id)?).await?;
            info!(question_id = %record.question_id, topic = %topic, "Tagged question");
            record.topics.insert(topic);
        }

        self.upsert(&record).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Field;
    use crate::domain::search::extractor::{ChatError, MockChatModel};
    use crate::domain::search::store::SqliteMetadataStore;
    use crate::domain::search::MetadataStore;

    async fn memory_writer() -> CatalogueWriter {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let writer = CatalogueWriter::new(pool);
        writer.ensure_schema().await.unwrap();
        writer
    }

    fn draft(id: &str, median: u32, topics: &[&str]) -> QuestionDraft {
        QuestionDraft {
            id: id.to_string(),
            median,
            module: "Algorithms 1".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn draft_becomes_labelled_record() {
        let record = draft("y2022p2q10", 12, &["Graphs"]).into_record().unwrap();
        assert_eq!(record.question_id, "y2022p2q10");
        assert_eq!(record.year, 2022);
        assert_eq!(record.paper, "Paper 2");
        assert_eq!(record.question_number, "Question 10");
        assert_eq!(record.difficulty, Difficulty::Medium);
    }

    #[test]
    fn draft_with_bad_id_is_rejected() {
        let err = draft("question-7", 12, &[]).into_record().unwrap_err();
        assert!(matches!(err, IngestError::QuestionId(_)));
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let writer = memory_writer().await;
        let mut record = draft("y2022p1q3", 16, &["Finite Automata"]).into_record().unwrap();
        writer.upsert(&record).await.unwrap();

        record.difficulty = Difficulty::Hard;
        writer.upsert(&record).await.unwrap();

        let store = SqliteMetadataStore::from_pool(writer.pool.clone());
        let difficulties = store.distinct_values(Field::Difficulty).await.unwrap();
        assert_eq!(difficulties.into_iter().collect::<Vec<_>>(), vec!["Hard"]);
    }

    #[tokio::test]
    async fn ingest_tags_untagged_questions() {
        let writer = memory_writer().await;
        let model = MockChatModel::replying("\"Turing Machines\"\n");
        let tagger = ModelTopicTagger::new(model.clone());

        let record = writer
            .ingest(draft("y2023p8q3", 8, &[]), &tagger, &ArchiveUrl::default())
            .await
            .unwrap();

        assert_eq!(record.topics.iter().collect::<Vec<_>>(), vec!["Turing Machines"]);
        assert_eq!(record.difficulty, Difficulty::Hard);
        let (_, user) = model.last_prompt().unwrap();
        assert!(user.ends_with("/y2023p8q3.pdf"));
    }

    #[tokio::test]
    async fn ingest_keeps_existing_topics() {
        let writer = memory_writer().await;
        let model = MockChatModel::replying("Sets");
        let tagger = ModelTopicTagger::new(model.clone());

        let record = writer
            .ingest(draft("y2021p1q1", 15, &["Graphs"]), &tagger, &ArchiveUrl::default())
            .await
            .unwrap();

        assert!(record.topics.contains("Graphs"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn tagger_rejects_rambling_replies() {
        let url = ArchiveUrl::default().question_pdf(2023, 8, 3).unwrap();

        let tagger = ModelTopicTagger::new(MockChatModel::replying("Turing Machines\nor maybe Automata"));
        assert!(matches!(tagger.tag(&url).await, Err(IngestError::Tagging(_))));

        let tagger = ModelTopicTagger::new(MockChatModel::failing(ChatError::EmptyResponse));
        assert!(matches!(tagger.tag(&url).await, Err(IngestError::Tagging(_))));
    }
}
