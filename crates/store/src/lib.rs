//! SQLite storage for the review engine.
//!
//! Opens a pipeline database read-only, records which family tables and
//! columns it carries, and serves records in rowid order.

mod schema;
mod sqlite;

pub use schema::detect_schema;
pub use sqlite::SqliteSource;
