use docs_core::{DocumentStore, InputDoc, SearchEngine};
use serde_json::{json, Value};
use server::{AppContext, McpServer, ToolHit};

fn server() -> McpServer {
    let docs = vec![
        InputDoc {
            id: Some("1".into()),
            title: "Invoice Create API".into(),
            body: "Use invoice.create to create an invoice record...".into(),
            source_ref: Some("docs/invoice.md".into()),
        },
        InputDoc {
            id: Some("2".into()),
            title: "Refund API".into(),
            body: "Use refund.create to issue a refund...".into(),
            source_ref: Some("docs/refund.md".into()),
        },
    ];
    let engine = SearchEngine::build(DocumentStore::from_inputs(docs).unwrap()).unwrap();
    McpServer::new(AppContext::new(engine))
}

/// Feed newline-delimited messages through the server and collect its replies.
async fn session(messages: &[Value]) -> Vec<Value> {
    let input: String = messages.iter().map(|m| format!("{m}\n")).collect();
    let mut output: Vec<u8> = Vec::new();
    server().serve(input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn call(id: u64, query: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "search_paynow_component_documentation", "arguments": { "query": query } }
    })
}

#[tokio::test]
async fn handshake_and_discovery() {
    let replies = session(&[
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": { "protocolVersion": "2024-11-05", "capabilities": {} } }),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "prompts/list" }),
    ])
    .await;

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "search-paynow-component-documentation");
    assert_eq!(replies[0]["result"]["protocolVersion"], "2024-11-05");
    let tools = replies[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "search_paynow_component_documentation");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
    assert_eq!(replies[2]["result"]["prompts"][0]["arguments"][0]["required"], true);
}

#[tokio::test]
async fn tool_call_returns_ranked_hits() {
    let replies = session(&[call(1, json!("invoice create"))]).await;
    let result = &replies[0]["result"];
    assert_eq!(result["isError"], false);
    let hits: Vec<ToolHit> = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Invoice Create API");
    assert_eq!(hits[0].source_ref, "docs/invoice.md");
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn no_match_is_an_empty_array() {
    let replies = session(&[call(1, json!("webhook signature"))]).await;
    assert_eq!(replies[0]["result"]["isError"], false);
    assert_eq!(replies[0]["result"]["content"][0]["text"], "[]");
}

#[tokio::test]
async fn invalid_queries_do_not_stop_the_server() {
    let replies = session(&[
        call(1, json!("")),
        call(2, json!(42)),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": "search_paynow_component_documentation" } }),
        call(4, json!("refund")),
    ])
    .await;

    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0]["result"]["isError"], true);
    assert_eq!(replies[0]["result"]["content"][0]["text"], "query is empty");
    assert_eq!(replies[1]["error"]["code"], -32602);
    assert_eq!(replies[2]["error"]["code"], -32602);
    assert_eq!(replies[3]["result"]["isError"], false);
}

#[tokio::test]
async fn prompt_wraps_results_in_a_user_message() {
    let replies = session(&[
        json!({ "jsonrpc": "2.0", "id": 1, "method": "prompts/get", "params": { "name": "search_paynow_component_documentation", "arguments": { "query": "refund" } } }),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "prompts/get", "params": { "name": "search_paynow_component_documentation", "arguments": {} } }),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "prompts/get", "params": { "name": "search_paynow_component_documentation", "arguments": { "query": "the" } } }),
    ])
    .await;

    assert_eq!(replies[0]["result"]["description"], "Search results");
    assert_eq!(replies[0]["result"]["messages"][0]["role"], "user");
    assert!(replies[0]["result"]["messages"][0]["content"]["text"].as_str().unwrap().contains("Refund API"));
    assert_eq!(replies[1]["error"]["message"], "Query is required");
    assert_eq!(replies[2]["result"]["description"], "Search failed");
}

#[tokio::test]
async fn repeated_tool_calls_are_identical() {
    let replies = session(&[call(1, json!("Invoice API")), call(1, json!("invoice   api"))]).await;
    assert_eq!(replies[0], replies[1]);
}
