//! Naming and link conventions of the Computer Laboratory past-paper archive.
//!
//! Every archived question is addressed by an identifier such as `y2022p2q10`
//! (year 2022, paper 2, question 10) and served as a PDF under a fixed link
//! pattern.

mod archive_url;
mod labels;
mod question_id;

pub use archive_url::*;
pub use labels::*;
pub use question_id::*;
