//! One-shot workflow execution endpoint.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::{json, Value};
use wiremock::ResponseTemplate;

const EXECUTE: &str = "/functions/v1/workflow-execute";

fn completion(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn workflow_body() -> Value {
    json!({
        "nodes": [
            {"id": "q", "type": "userQuery", "data": {"label": "User Query", "config": {}}},
            {"id": "kb", "type": "knowledgeBase", "data": {"label": "Knowledge Base", "config": {"name": "Handbook", "documents": "policies.pdf"}}},
            {"id": "llm", "type": "llmEngine", "data": {"label": "LLM Engine", "config": {
                "model": "openai/gpt-5", "systemPrompt": "Be exact.", "temperature": "0.3", "maxTokens": 200
            }}},
            {"id": "out", "type": "output", "data": {"label": "Output", "config": {}}}
        ],
        "edges": [
            {"id": "e1", "source": "q", "target": "kb"},
            {"id": "e2", "source": "kb", "target": "llm"},
            {"id": "e3", "source": "llm", "target": "out"}
        ],
        "userInput": "What is the leave policy?"
    })
}

#[tokio::test]
async fn executes_workflow_once() {
    let gateway = gateway(completion(json!("Twenty days."))).await;
    let app = app(&deps_for(&gateway));

    let response = send(&app, json_request(Method::POST, EXECUTE, &workflow_body())).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({
            "success": true,
            "output": "Twenty days.",
            "nodesExecuted": ["q", "kb", "llm", "out"],
            "model": "openai/gpt-5"
        })
    );

    let requests = gateway_requests(&gateway).await;
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent["model"], "openai/gpt-5");
    assert_eq!(sent["max_tokens"], 200);
    assert!((sent["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!(sent.get("stream").is_none());
    assert_eq!(
        sent["messages"],
        json!([
            {"role": "system", "content": "Be exact.\n\nContext:\nKnowledge Base: Handbook\nDocuments: policies.pdf\n"},
            {"role": "user", "content": "What is the leave policy?"}
        ])
    );
}

#[tokio::test]
async fn minimal_workflow_uses_defaults() {
    let gateway = gateway(completion(json!("Hi"))).await;
    let app = app(&deps_for(&gateway));

    let response = send(
        &app,
        json_request(Method::POST, EXECUTE, &json!({"nodes": [], "edges": [], "userInput": "Hello"})),
    )
    .await;

    assert_eq!(response.json()["model"], "google/gemini-2.5-flash");
    let sent = &gateway_requests(&gateway).await[0];
    assert_eq!(sent["max_tokens"], 1024);
    assert_eq!(sent["messages"][0]["content"], "You are a helpful AI assistant.");
}

#[tokio::test]
async fn missing_content_reports_placeholder() {
    let gateway = gateway(completion(Value::Null)).await;
    let app = app(&deps_for(&gateway));

    let response = send(&app, json_request(Method::POST, EXECUTE, &workflow_body())).await;

    assert_eq!(response.json()["output"], "No response generated");
}

#[tokio::test]
async fn rate_limit_and_payment_statuses_are_mapped() {
    for (upstream, expected, message) in [
        (429, StatusCode::TOO_MANY_REQUESTS, "Rate limits exceeded"),
        (402, StatusCode::PAYMENT_REQUIRED, "Payment required"),
    ] {
        let gateway = gateway(ResponseTemplate::new(upstream)).await;
        let app = app(&deps_for(&gateway));

        let response = send(&app, json_request(Method::POST, EXECUTE, &workflow_body())).await;

        assert_eq!(response.status, expected);
        assert_eq!(response.json(), json!({"error": message}));
    }
}

#[tokio::test]
async fn gateway_failure_reports_unsuccessful_run() {
    let gateway = gateway(ResponseTemplate::new(500).set_body_string("boom")).await;
    let app = app(&deps_for(&gateway));

    let response = send(&app, json_request(Method::POST, EXECUTE, &workflow_body())).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json(), json!({"success": false, "error": "AI gateway error"}));
}

#[tokio::test]
async fn unknown_node_type_is_rejected() {
    let gateway = gateway(completion(json!("unused"))).await;
    let app = app(&deps_for(&gateway));

    let body = json!({
        "nodes": [{"id": "x", "type": "webhook", "data": {"label": "Webhook", "config": {}}}],
        "edges": [],
        "userInput": "Hi"
    });
    let response = send(&app, json_request(Method::POST, EXECUTE, &body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["success"], false);
    assert!(gateway_requests(&gateway).await.is_empty());
}
