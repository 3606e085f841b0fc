use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// One of the catalogue columns a category token can refer to.
///
/// The string form is the column name in the `questions` table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum Field {
    Year,
    Paper,
    QuestionNumber,
    Topics,
    Module,
    Difficulty,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Year,
        Field::Paper,
        Field::QuestionNumber,
        Field::Topics,
        Field::Module,
        Field::Difficulty,
    ];

    pub fn column(self) -> &'static str {
        self.into()
    }

    /// Free-text fields are matched by case-insensitive substring, the rest
    /// by exact equality.
    pub fn is_free_text(self) -> bool {
        matches!(self, Field::Topics | Field::Module)
    }
}
