//! Transports for the documentation search tool: MCP over stdio and an axum HTTP app.
//!
//! Both take an [`AppContext`] built once at startup and never touch retrieval
//! internals beyond [`SearchEngine::search`].

use docs_core::{QueryError, SearchEngine};
use std::sync::Arc;

pub mod http;
pub mod mcp;
pub mod tool;

pub use http::build_app;
pub use mcp::McpServer;
pub use tool::ToolHit;

/// Process-wide state handed to every handler.
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<SearchEngine>,
    /// Results per tool call.
    pub top_k: usize,
}

impl AppContext {
    pub fn new(engine: SearchEngine) -> Self {
        let top_k = engine.config().default_top_k;
        Self { engine: Arc::new(engine), top_k }
    }

    /// The tool operation: ranked hits for `query` with the internal default bound.
    pub fn search_docs(&self, query: &str) -> Result<Vec<ToolHit>, QueryError> {
        let hits = self.engine.search(query, self.top_k)?;
        Ok(hits.into_iter().map(ToolHit::from).collect())
    }
}
