use docs_core::SearchHit;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TOOL_NAME: &str = "search_paynow_component_documentation";
pub const SERVER_NAME: &str = "search-paynow-component-documentation";

const TOOL_DESCRIPTION: &str = "Search PayNow Component documentation. Any non-English input will be auto-translated to English before populating the query.";
const PROMPT_DESCRIPTION: &str = "Search PayNow Component documentation and return matching sections";
const QUERY_DESCRIPTION: &str = "Search keywords in English. Any non-English input will be auto-translated to English before populating this field.";

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

/// One entry of the tool's result array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolHit {
    pub title: String,
    pub snippet: String,
    #[serde(rename = "sourceRef")]
    pub source_ref: String,
    pub score: f64,
}

impl From<SearchHit> for ToolHit {
    fn from(hit: SearchHit) -> Self {
        Self { title: hit.title, snippet: hit.snippet, source_ref: hit.source_ref, score: hit.score }
    }
}

pub fn input_schema() -> Value {
    json!({
        "type": "object",
        "title": "SearchArgs",
        "description": "Parameters for searching PayNow Component documentation.",
        "properties": {
            "query": { "type": "string", "title": "Query", "description": QUERY_DESCRIPTION }
        },
        "required": ["query"]
    })
}

pub fn tool_definition() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": TOOL_DESCRIPTION,
        "inputSchema": input_schema(),
    })
}

pub fn prompt_definition() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": PROMPT_DESCRIPTION,
        "arguments": [{
            "name": "query",
            "description": QUERY_DESCRIPTION,
            "required": true
        }]
    })
}
