use std::path::PathBuf;
use thiserror::Error;

/// The corpus could not be loaded. Always fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read corpus at {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to walk corpus directory {}: {source}", .path.display())]
    Walk { path: PathBuf, source: walkdir::Error },

    #[error("malformed document at {location}: {source}")]
    Malformed { location: String, source: serde_json::Error },

    #[error("unexpected JSON in {}: expected an object or an array of objects", .path.display())]
    UnexpectedShape { path: PathBuf },

    #[error("document at {location} has an empty `{field}`")]
    MissingField { location: String, field: &'static str },

    #[error("duplicate document id `{id}` at {location}")]
    DuplicateId { id: String, location: String },
}

/// The index could not be built. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("corpus is empty, nothing to index")]
    EmptyCorpus,
}

/// A query that cannot be searched. Recoverable; reported back to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    #[error("query `{query}` contains no searchable terms")]
    NoTerms { query: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid search config: `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Either way the engine never becomes ready.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
