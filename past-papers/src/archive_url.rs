use url::Url;

use crate::QuestionId;

pub const DEFAULT_ARCHIVE_URL: &str = "https://www.cl.cam.ac.uk/teaching/exams/pastpapers";

/// Base location of the past-paper archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUrl(Url);

impl AsRef<str> for ArchiveUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for ArchiveUrl {
    fn default() -> Self {
        Self(Url::parse(&format!("{DEFAULT_ARCHIVE_URL}/")).expect("default archive URL is valid"))
    }
}

impl ArchiveUrl {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let trimmed = base.trim().trim_end_matches('/');
        Url::parse(&format!("{trimmed}/")).map(Self)
    }

    /// Link to the PDF of a single question.
    pub fn question_pdf(&self, year: u16, paper: u8, question: u8) -> Result<Url, url::ParseError> {
        self.for_id(&QuestionId::new(year, paper, question))
    }

    pub fn for_id(&self, id: &QuestionId) -> Result<Url, url::ParseError> {
        self.0.join(&format!("{id}.pdf"))
    }
}
