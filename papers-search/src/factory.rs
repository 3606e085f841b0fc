//! Composition root - the only place that picks concrete store and model types.

use crate::config::Settings;
use crate::domain::search::extractor::GeminiCategoryExtractor;
use crate::domain::search::store::SqliteMetadataStore;
use crate::domain::search::{PipelineConfig, SearchPipeline};

pub type AppPipeline = SearchPipeline<GeminiCategoryExtractor, SqliteMetadataStore>;

/// Build the production pipeline. Nothing is opened or contacted until the
/// first search.
pub fn build_pipeline(settings: &Settings) -> AppPipeline {
    let extractor = GeminiCategoryExtractor::gemini(&settings.extractor);
    let store = SqliteMetadataStore::open(&settings.store);

    SearchPipeline::new(extractor, store, PipelineConfig::from(settings))
}
