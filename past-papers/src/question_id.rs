use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionIdError {
    #[error("question id is empty")]
    Empty,
    #[error("malformed question id '{0}', expected e.g. y2022p2q10")]
    Malformed(String),
}

/// Identifier of a single archived question, e.g. `y2022p2q10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId {
    pub year: u16,
    pub paper: u8,
    pub question: u8,
}

impl QuestionId {
    pub fn new(year: u16, paper: u8, question: u8) -> Self {
        Self {
            year,
            paper,
            question,
        }
    }

    /// Parses the canonical `y{year}p{paper}q{question}` form.
    ///
    /// Paper and question numbers may have one or two digits.
    pub fn parse(raw: &str) -> Result<Self, QuestionIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(QuestionIdError::Empty);
        }
        let malformed = || QuestionIdError::Malformed(raw.to_owned());

        let rest = raw.strip_prefix('y').ok_or_else(malformed)?;
        let (year, rest) = rest.split_once('p').ok_or_else(malformed)?;
        let (paper, question) = rest.split_once('q').ok_or_else(malformed)?;

        if year.len() != 4 {
            return Err(malformed());
        }

        Ok(Self {
            year: parse_digits(year).ok_or_else(malformed)?,
            paper: parse_digits(paper).ok_or_else(malformed)?,
            question: parse_digits(question).ok_or_else(malformed)?,
        })
    }
}

fn parse_digits<T: FromStr>(digits: &str) -> Option<T> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for QuestionId {
    type Err = QuestionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y{}p{}q{}", self.year, self.paper, self.question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_digit_paper() {
        let id = QuestionId::parse("y2022p2q10").unwrap();
        assert_eq!(id, QuestionId::new(2022, 2, 10));
    }

    #[test]
    fn parses_two_digit_paper() {
        let id = QuestionId::parse("y2020p10q3").unwrap();
        assert_eq!(id, QuestionId::new(2020, 10, 3));
    }

    #[test]
    fn display_is_canonical() {
        let id = QuestionId::new(2023, 8, 3);
        assert_eq!(id.to_string(), "y2023p8q3");
        assert_eq!(id.to_string().parse::<QuestionId>().unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(QuestionId::parse("   "), Err(QuestionIdError::Empty));
        for raw in ["2022p2q10", "y22p2q10", "y2022q10", "y2022p2", "y2022pxq1", "y2022p2q"] {
            assert!(
                matches!(QuestionId::parse(raw), Err(QuestionIdError::Malformed(_))),
                "{raw} should be rejected"
            );
        }
    }
}
