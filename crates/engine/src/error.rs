use std::fmt;

use crate::model::EntityKind;

#[derive(Debug)]
pub enum ReviewError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate family, zero page size, etc.).
    ConfigValidation(String),
    /// A family's base collection could not be fetched. Aborts the run.
    Fetch { family: EntityKind, message: String },
    /// The rendering collaborator rejected a record, page or index.
    Sink(String),
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Fetch { family, message } => {
                write!(f, "cannot fetch '{family}' collection: {message}")
            }
            Self::Sink(msg) => write!(f, "output error: {msg}"),
        }
    }
}

impl std::error::Error for ReviewError {}

/// Errors reported by a [`crate::RecordSource`] implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The family's table does not exist in this dataset.
    MissingTable(String),
    /// Any other query failure.
    Query(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTable(table) => write!(f, "table '{table}' does not exist"),
            Self::Query(msg) => write!(f, "query failed: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}
