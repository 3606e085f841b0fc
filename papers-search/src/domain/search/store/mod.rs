//! Question store implementations.

#[cfg(test)]
mod mock;
mod sqlite;

#[cfg(test)]
pub use mock::MockMetadataStore;
pub use sqlite::SqliteMetadataStore;
