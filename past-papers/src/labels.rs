//! Human-readable paper and question labels as stored in the catalogue.

pub fn paper_label(paper: u8) -> String {
    format!("Paper {paper}")
}

pub fn question_label(question: u8) -> String {
    format!("Question {question}")
}

/// Extracts the trailing number of a label like `"Question 10"`.
pub fn label_number(label: &str) -> Option<u32> {
    label
        .trim()
        .rsplit(|c: char| !c.is_ascii_digit())
        .next()
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse().ok())
}
