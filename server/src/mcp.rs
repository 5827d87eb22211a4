//! Minimal MCP server: JSON-RPC 2.0, one message per line.
//!
//! Exposes a single tool and a single prompt, both named
//! [`TOOL_NAME`](crate::tool::TOOL_NAME). Query validation failures are tool
//! results with `isError: true`; malformed requests are JSON-RPC errors.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::tool::{self, SearchArgs, SERVER_NAME, TOOL_NAME};
use crate::AppContext;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications. An explicit `null` is still a request.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error) }
    }
}

#[derive(Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

pub struct McpServer {
    ctx: AppContext,
}

impl McpServer {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        tracing::info!(server = SERVER_NAME, "serving MCP over stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() { continue; }
            if let Some(resp) = self.handle_line(&line) {
                let mut out = serde_json::to_vec(&resp)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }
        tracing::info!("input closed, shutting down");
        Ok(())
    }

    /// Handle one raw message. `None` for notifications.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => self.handle_value(value),
            Err(e) => Some(JsonRpcResponse::failure(Value::Null, JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}")))),
        }
    }

    pub fn handle_value(&self, value: Value) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(req) if req.jsonrpc != "2.0" => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: unsupported jsonrpc version `{}`", req.jsonrpc)),
            )),
            Ok(req) => self.handle(req),
            Err(e) => Some(JsonRpcResponse::failure(id, JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")))),
        }
    }

    pub fn handle(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = req.id else {
            tracing::debug!(method = %req.method, "notification");
            return None;
        };
        tracing::debug!(method = %req.method, "request");

        let outcome = match req.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [tool::tool_definition()] })),
            "tools/call" => self.call_tool(req.params),
            "prompts/list" => Ok(json!({ "prompts": [tool::prompt_definition()] })),
            "prompts/get" => self.get_prompt(req.params),
            other => Err(JsonRpcError::new(METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        if params.name != TOOL_NAME {
            return Err(JsonRpcError::new(INVALID_PARAMS, format!("Unknown tool: {}", params.name)));
        }
        let args: SearchArgs = serde_json::from_value(params.arguments.unwrap_or_else(|| json!({})))
            .map_err(|e| JsonRpcError::new(INVALID_PARAMS, e.to_string()))?;

        match self.ctx.search_docs(&args.query) {
            Ok(hits) => {
                let text = serde_json::to_string(&hits).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
                Ok(json!({ "content": [{ "type": "text", "text": text }], "isError": false }))
            }
            Err(e) => {
                tracing::info!(error = %e, "rejected query");
                Ok(json!({ "content": [{ "type": "text", "text": e.to_string() }], "isError": true }))
            }
        }
    }

    fn get_prompt(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: GetPromptParams = parse_params(params)?;
        if params.name != TOOL_NAME {
            return Err(JsonRpcError::new(INVALID_PARAMS, format!("Unknown prompt: {}", params.name)));
        }
        let query = params
            .arguments
            .as_ref()
            .and_then(|args| args.get("query"))
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Query is required"))?;

        let (description, text) = match self.ctx.search_docs(query) {
            Ok(hits) => {
                let text = serde_json::to_string(&hits).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))?;
                ("Search results", text)
            }
            Err(e) => ("Search failed", e.to_string()),
        };
        Ok(json!({
            "description": description,
            "messages": [{ "role": "user", "content": { "type": "text", "text": text } }]
        }))
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {}, "prompts": {} },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
    })
}

// Keeps `"id": null` distinct from a missing id.
fn present<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::new(INVALID_PARAMS, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docs_core::{DocumentStore, InputDoc, SearchEngine};

    fn server() -> McpServer {
        let store = DocumentStore::from_inputs(vec![InputDoc {
            id: None,
            title: "Refund API".into(),
            body: "Use refund.create to issue a refund.".into(),
            source_ref: Some("docs/refund.md".into()),
        }])
        .unwrap();
        McpServer::new(AppContext::new(SearchEngine::build(store).unwrap()))
    }

    #[test]
    fn notifications_get_no_response() {
        assert!(server().handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
    }

    #[test]
    fn null_id_is_still_a_request() {
        let resp = server().handle_line(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.result, Some(json!({})));
    }

    #[test]
    fn wrong_or_missing_version_is_an_invalid_request() {
        let resp = server().handle_line(r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#).unwrap();
        assert_eq!(resp.id, json!(7));
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
        let resp = server().handle_line(r#"{"id":8,"method":"ping"}"#).unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let resp = server().handle_line("{not json").unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);
    }

    #[test]
    fn missing_method_is_an_invalid_request() {
        let resp = server().handle_line(r#"{"jsonrpc":"2.0","id":4}"#).unwrap();
        assert_eq!(resp.id, json!(4));
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn unknown_method_is_reported() {
        let resp = server().handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#).unwrap();
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn wrong_tool_name_is_invalid_params() {
        let resp = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"other","arguments":{"query":"x"}}}"#)
            .unwrap();
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }
}
