//! Search pipeline combining category extraction, planning and store lookup.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::planner::QueryPlanner;
use super::traits::{CategoryExtractor, MetadataStore, Result, SearchError};
use super::types::{CategoryVocabulary, SearchHit, SearchResult, SearchStage};
use crate::config::Settings;

/// Configuration for the search pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on a single extractor call
    pub extract_timeout: Duration,
    /// Extractor attempts for service failures; malformed replies are not retried
    pub max_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract_timeout: Duration::from_secs(20),
            max_attempts: 2,
        }
    }
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            extract_timeout: settings.extractor.timeout(),
            max_attempts: settings.search.max_attempts.max(1),
        }
    }
}

/// Search pipeline turning free text into catalogued questions.
///
/// Every call rebuilds the vocabulary from the store and keeps no state
/// between calls. Failures never escape [`SearchPipeline::search`]: they turn
/// into an empty, degraded [`SearchResult`].
///
/// # Type Parameters
///
/// * `E` - CategoryExtractor implementation mapping queries onto categories
/// * `S` - MetadataStore implementation holding the questions
///
/// # Examples
///
/// ```ignore
/// let pipeline = SearchPipeline::new(extractor, store, PipelineConfig::default());
/// let result = pipeline.search("automata 2022").await;
/// println!("{}", result.status);
/// ```
pub struct SearchPipeline<E, S>
where
    E: CategoryExtractor,
    S: MetadataStore,
{
    extractor: E,
    store: S,
    planner: QueryPlanner,
    config: PipelineConfig,
}

/// Stage bookkeeping for one `search` call.
struct Run {
    stage: SearchStage,
}

impl Run {
    fn new() -> Self {
        Self {
            stage: SearchStage::Idle,
        }
    }

    fn advance(&mut self, next: SearchStage) {
        debug!(from = %self.stage, to = %next, "Search stage");
        self.stage = next;
    }

    fn fail(&mut self, error: &SearchError) -> SearchResult {
        let reason = error.kind();
        self.advance(SearchStage::Failed(reason));
        warn!(error = %error, reason = %reason, "Search degraded");
        SearchResult::degraded(reason, degraded_status(error))
    }
}

fn degraded_status(error: &SearchError) -> String {
    match error {
        SearchError::StoreUnavailable(_) => {
            "The question catalogue could not be read, no results available".to_string()
        }
        SearchError::ExternalService(_) => {
            "The search service is unavailable right now, try again later".to_string()
        }
        SearchError::MalformedResponse(_) => {
            "The search service returned an unreadable answer, try rephrasing".to_string()
        }
        other => other.to_string(),
    }
}

impl<E, S> SearchPipeline<E, S>
where
    E: CategoryExtractor,
    S: MetadataStore,
{
    /// Create a new search pipeline.
    pub fn new(extractor: E, store: S, config: PipelineConfig) -> Self {
        Self {
            extractor,
            store,
            planner: QueryPlanner::new(),
            config,
        }
    }

    /// Create a search pipeline with default configuration.
    pub fn with_defaults(extractor: E, store: S) -> Self {
        Self::new(extractor, store, PipelineConfig::default())
    }

    /// Execute a search query.
    ///
    /// Blank queries are rejected without touching the store or the
    /// extractor. Results are ordered newest year first.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> SearchResult {
        let query = query.trim();
        if query.is_empty() {
            return SearchResult::rejected(
                SearchError::EmptyQuery.kind(),
                "Enter something to search for",
            );
        }

        let mut run = Run::new();

        run.advance(SearchStage::Extracting);
        let vocabulary = match self.store.vocabulary().await {
            Ok(vocabulary) => vocabulary,
            Err(e) => return run.fail(&e),
        };
        let categories = match self.extract_with_retry(query, &vocabulary).await {
            Ok(categories) => categories,
            Err(e) => return run.fail(&e),
        };

        run.advance(SearchStage::Planning);
        let predicate = self.planner.plan(&categories, &vocabulary);

        run.advance(SearchStage::Querying);
        let records = match self.planner.execute(&predicate, &self.store).await {
            Ok(records) => records,
            Err(e) => return run.fail(&e),
        };

        run.advance(SearchStage::Done);
        let items: Vec<SearchHit> = records
            .into_iter()
            .map(|record| SearchHit {
                matched: predicate.matched_tokens(&record),
                record,
            })
            .collect();

        info!(
            categories = categories.len(),
            results = items.len(),
            "Search completed"
        );
        SearchResult::found(items, categories.into_iter().collect())
    }

    async fn extract_with_retry(
        &self,
        query: &str,
        vocabulary: &CategoryVocabulary,
    ) -> Result<BTreeSet<String>> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.extract_once(query, vocabulary).await {
                Err(SearchError::ExternalService(reason)) if attempt < attempts => {
                    warn!(attempt, reason = %reason, "Category extraction failed, retrying");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn extract_once(
        &self,
        query: &str,
        vocabulary: &CategoryVocabulary,
    ) -> Result<BTreeSet<String>> {
        let timeout = self.config.extract_timeout;
        tokio::time::timeout(timeout, self.extractor.extract(query, vocabulary))
            .await
            .map_err(|_| {
                SearchError::ExternalService(format!(
                    "no answer within {} ms",
                    timeout.as_millis()
                ))
            })?
    }
}
