//! Retrieval core for the PayNow component documentation server.
//!
//! Load a [`DocumentStore`] once, hand it to [`SearchEngine::build`], then
//! share the engine for the life of the process.

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod normalize;
pub mod search;
pub mod snippet;
pub mod tokenizer;

pub use config::SearchConfig;
pub use document::{DocId, Document, DocumentStore, InputDoc};
pub use error::{ConfigError, IndexError, LoadError, QueryError, StartupError};
pub use index::{InvertedIndex, Posting, TermId};
pub use search::{EngineStats, SearchEngine, SearchHit, SearchResults};
