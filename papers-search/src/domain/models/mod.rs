mod field;
mod question;

pub use field::*;
pub use question::*;
