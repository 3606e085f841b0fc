pub mod export;
pub mod ingest;
pub mod models;
pub mod search;
