use std::collections::BTreeSet;

use past_papers::{label_number, ArchiveUrl};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use super::Field;

/// Separator used when a record's topics are flattened into one column.
pub const TOPIC_SEPARATOR: &str = ", ";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Difficulty {
    /// Bands a question by the median mark candidates scored on it.
    pub fn from_median(median: u32) -> Self {
        match median {
            15.. => Difficulty::Easy,
            10..=14 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// Reads a stored label, mapping anything unrecognised to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }
}

/// A single catalogued exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_id: String,
    pub year: i32,
    /// e.g. "Paper 1"
    pub paper: String,
    /// e.g. "Question 5"
    pub question_number: String,
    pub topics: BTreeSet<String>,
    pub module: String,
    pub difficulty: Difficulty,
}

impl QuestionRecord {
    /// Values this record holds for `field`, one per topic for `Topics`.
    pub fn values(&self, field: Field) -> Vec<String> {
        match field {
            Field::Year => vec![self.year.to_string()],
            Field::Paper => vec![self.paper.clone()],
            Field::QuestionNumber => vec![self.question_number.clone()],
            Field::Topics => self.topics.iter().cloned().collect(),
            Field::Module => vec![self.module.clone()],
            Field::Difficulty => vec![self.difficulty.to_string()],
        }
    }

    pub fn topics_column(&self) -> String {
        self.topics
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(TOPIC_SEPARATOR)
    }

    /// Link to this question's PDF in the archive.
    ///
    /// Returns `None` when the year or labels carry no usable number.
    pub fn source_url(&self, archive: &ArchiveUrl) -> Option<Url> {
        let year = u16::try_from(self.year).ok()?;
        let paper = u8::try_from(label_number(&self.paper)?).ok()?;
        let question = u8::try_from(label_number(&self.question_number)?).ok()?;
        archive.question_pdf(year, paper, question).ok()
    }
}

pub fn split_topics(column: &str) -> BTreeSet<String> {
    column
        .split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_owned)
        .collect()
}
