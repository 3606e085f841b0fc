//! Handing search results to the PDF merge step.
//!
//! Merging itself happens elsewhere; this side only guarantees the archive
//! links arrive in presentation order without duplicates.

use std::path::Path;

use async_trait::async_trait;
use itertools::Itertools;
use past_papers::ArchiveUrl;
use tracing::info;
use url::Url;

use crate::domain::models::QuestionRecord;
use crate::domain::search::SearchResult;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    EmptyResult,
    #[error("no archive link can be derived for {0}")]
    MissingLink(String),
    #[error("merging failed: {0}")]
    Merge(String),
}

/// Combines the PDFs behind `urls`, in order, into one file at `output`.
#[async_trait]
pub trait PdfMerger: Send + Sync {
    async fn merge(&self, urls: &[Url], output: &Path) -> Result<(), ExportError>;
}

/// Archive links for `records`, in order, each link once.
pub fn source_urls<'a, I>(records: I, archive: &ArchiveUrl) -> Result<Vec<Url>, ExportError>
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let urls: Vec<Url> = records
        .into_iter()
        .map(|record| {
            record
                .source_url(archive)
                .ok_or_else(|| ExportError::MissingLink(record.question_id.clone()))
        })
        .collect::<Result<_, _>>()?;

    Ok(urls.into_iter().unique().collect())
}

/// Merge every question in `result` into `output`.
///
/// Returns the number of PDFs handed to the merger.
pub async fn export_results<M>(
    result: &SearchResult,
    archive: &ArchiveUrl,
    merger: &M,
    output: &Path,
) -> Result<usize, ExportError>
where
    M: PdfMerger + ?Sized,
{
    if result.is_empty() {
        return Err(ExportError::EmptyResult);
    }

    let urls = source_urls(result.records(), archive)?;
    merger.merge(&urls, output).await?;

    info!(pdfs = urls.len(), output = %output.display(), "Exported search results");
    Ok(urls.len())
}
