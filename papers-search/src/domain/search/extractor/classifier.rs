use std::collections::BTreeSet;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::chat::{ChatModel, GeminiChat};
use crate::config::ExtractorSettings;
use crate::domain::search::parser::parse_category_list;
use crate::domain::search::traits::{CategoryExtractor, Result, SearchError};
use crate::domain::search::types::CategoryVocabulary;

const SYSTEM_PROMPT: &str = "\
You map a student's search query onto categories of a catalogue of past exam questions.
You are given the list of available categories and the query.
Return the categories the query asks for:
- Prefer exact matches from the list.
- Include only closely related synonyms or subtopics of what was asked for.
- Expand explicit ranges, e.g. \"2022 to 2024\" becomes \"2022\", \"2023\", \"2024\".
- Never return a broad parent category when the query names something narrower.
- Respond with nothing but a JSON list of strings, e.g. [\"Finite Automata\", \"2022\"].
- If nothing fits, respond with [].";

/// Category extractor that asks a chat model to pick categories.
pub struct ModelCategoryExtractor<C>
where
    C: ChatModel,
{
    model: C,
}

pub type GeminiCategoryExtractor = ModelCategoryExtractor<GeminiChat>;

impl<C> ModelCategoryExtractor<C>
where
    C: ChatModel,
{
    pub fn new(model: C) -> Self {
        Self { model }
    }
}

impl GeminiCategoryExtractor {
    pub fn gemini(settings: &ExtractorSettings) -> Self {
        Self::new(GeminiChat::new(settings))
    }
}

/// Categories are shuffled so their order does not bias the model.
fn build_prompt(query: &str, vocabulary: &CategoryVocabulary) -> String {
    let mut categories = vocabulary.flatten();
    categories.shuffle(&mut rand::thread_rng());
    let categories = serde_json::Value::from(categories);

    format!("Categories: {categories}\nQuery: {query}")
}

#[async_trait]
impl<C> CategoryExtractor for ModelCategoryExtractor<C>
where
    C: ChatModel,
{
    async fn extract(
        &self,
        query: &str,
        vocabulary: &CategoryVocabulary,
    ) -> Result<BTreeSet<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        if vocabulary.is_empty() {
            debug!("Vocabulary is empty, skipping classification");
            return Ok(BTreeSet::new());
        }

        let prompt = build_prompt(query, vocabulary);
        let raw = self
            .model
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| SearchError::ExternalService(e.to_string()))?;

        match parse_category_list(&raw) {
            Ok(tokens) => {
                debug!(query, ?tokens, "Extracted categories");
                Ok(tokens)
            }
            Err(e) => {
                warn!(query, raw = %raw, "Classification response is not a list");
                Err(e)
            }
        }
    }
}
