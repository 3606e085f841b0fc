//! Question search - free text in, catalogued exam questions out.
//!
//! A search runs in three steps:
//! - **Extraction**: a chat model maps the query onto category tokens, given
//!   every value currently stored (the vocabulary)
//! - **Planning**: tokens become a structured predicate, equality on Year,
//!   Paper, QuestionNumber and Difficulty, substring on Topics and Module
//! - **Querying**: the predicate runs against the store as parameterized SQL;
//!   results are deduplicated and ordered newest year first
//!
//! # Architecture
//!
//! The pipeline is built around trait abstractions for testability:
//!
//! - [`CategoryExtractor`] - Query classification (Gemini, mocks)
//! - [`MetadataStore`] - Question lookup (SQLite, mocks)
//!
//! # Example
//!
//! ```ignore
//! use papers_search::domain::search::{SearchPipeline, PipelineConfig};
//! use papers_search::domain::search::extractor::GeminiCategoryExtractor;
//! use papers_search::domain::search::store::SqliteMetadataStore;
//!
//! let extractor = GeminiCategoryExtractor::gemini(&settings.extractor);
//! let store = SqliteMetadataStore::open(&settings.store);
//! let pipeline = SearchPipeline::new(extractor, store, PipelineConfig::from(&settings));
//!
//! let result = pipeline.search("automata questions from 2022 to 2024").await;
//! ```
//!
//! # Failure handling
//!
//! [`SearchPipeline::search`] never fails. When the store or the model is
//! unavailable, it returns an empty [`SearchResult`] with `degraded` set and
//! the reason attached, so an interactive caller can always render something.

mod parser;
mod planner;
mod service;
mod traits;
mod types;

pub mod extractor;
pub mod store;

// Re-export main types
pub use parser::parse_category_list;
pub use planner::{Clause, Predicate, QueryPlanner};
pub use service::{PipelineConfig, SearchPipeline};
pub use traits::{CategoryExtractor, MetadataStore, Result, SearchError};
pub use types::{CategoryVocabulary, ErrorKind, SearchHit, SearchResult, SearchStage};
