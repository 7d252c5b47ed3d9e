//! Gateway Integration Tests
//!
//! Runs the axum gateway on an ephemeral port with the analyzer, anonymizer
//! and LLM stages served by wiremock, then drives it over real HTTP.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redact_gateway::config::{LlmSettings, PipelineSettings, StageTimeouts};
use redact_gateway::domain::Operator;
use redact_gateway::server::{self, AppState};
use redact_gateway::Orchestrator;

fn settings(stages: &MockServer, timeouts: StageTimeouts) -> PipelineSettings {
    PipelineSettings {
        analyzer_url: format!("{}/analyze", stages.uri()),
        anonymizer_url: format!("{}/anonymize", stages.uri()),
        llm: LlmSettings {
            base_url: format!("{}/v1", stages.uri()),
            api_key: Some("sk-mock".into()),
            model: "test-model".into(),
            max_tokens: 150,
            system_prompt: "You are a helpful assistant that analyzes anonymized log data."
                .into(),
        },
        timeouts,
        operator: Operator::default(),
        default_language: "en".into(),
    }
}

/// Start the gateway and return its base URL
async fn start_gateway(settings: PipelineSettings) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let state = AppState::new(Orchestrator::new(settings));
    tokio::spawn(server::serve(listener, state));
    format!("http://{}", address)
}

fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn mount_analyzer(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "entity_type": "PHONE_NUMBER", "start": 12, "end": 20, "score": 0.75 }
        ])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_anonymizer(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/anonymize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "My phone is <REDACTED>",
            "items": [{ "operator": "replace", "entity_type": "PHONE_NUMBER" }]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_llm(server: &MockServer, template: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

#[tokio::test]
async fn test_integrate_success() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 1).await;
    mount_anonymizer(&stages, 1).await;
    mount_llm(&stages, completion("No action needed."), 1).await;

    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;
    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "My phone is 555-1234", "entities": ["PHONE_NUMBER"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_none());
    assert_eq!(body["anonymized_text"], "My phone is <REDACTED>");
    assert_eq!(body["llm_analysis"], "No action needed.");
    assert_eq!(body["analyzer_results"][0]["entity_type"], "PHONE_NUMBER");
    assert!(body["timings_ms"].get("llm_analyze").is_some());
}

#[tokio::test]
async fn test_integrate_empty_text_is_400_without_calls() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 0).await;
    mount_anonymizer(&stages, 0).await;
    mount_llm(&stages, completion("unused"), 0).await;

    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;
    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Text is required");
    assert_eq!(body["stage"], "validation");
    assert!(stages.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_integrate_analyzer_unavailable_is_500() {
    let stages = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&stages)
        .await;
    mount_anonymizer(&stages, 0).await;
    mount_llm(&stages, completion("unused"), 0).await;

    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;
    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "My phone is 555-1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["stage"], "analyze");
    assert_eq!(body["error"], "Analyzer stage failed");
    assert!(body["details"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_integrate_llm_timeout_is_504() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 1).await;
    mount_anonymizer(&stages, 1).await;
    mount_llm(
        &stages,
        completion("too late").set_delay(Duration::from_secs(2)),
        1,
    )
    .await;

    let timeouts = StageTimeouts {
        llm_analyze: Duration::from_millis(200),
        ..StageTimeouts::default()
    };
    let base = start_gateway(settings(&stages, timeouts)).await;
    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "My phone is 555-1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 504);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["stage"], "llm_analyze");
    assert_eq!(body["kind"], "timeout");
}

#[tokio::test]
async fn test_integrate_invalid_json_is_400() {
    let stages = MockServer::start().await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;

    let response = http()
        .post(format!("{}/integrate", base))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body.get("error").is_some());
    assert!(body.get("details").is_some());
}

#[tokio::test]
async fn test_integrate_null_entities_is_400_without_calls() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 0).await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;

    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "hi", "entities": null }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(body["stage"], "validation");
    assert!(body["details"].as_str().unwrap().contains("entities"));
    assert!(stages.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_integrate_entities_list_forwarded_as_given() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 1).await;
    mount_anonymizer(&stages, 1).await;
    mount_llm(&stages, completion("ok"), 1).await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;

    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "hi", "entities": ["PERSON"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let requests = stages.received_requests().await.unwrap();
    let analyzer = requests
        .iter()
        .find(|r| r.url.path() == "/analyze")
        .expect("analyzer called");
    let sent: Value = serde_json::from_slice(&analyzer.body).unwrap();
    assert_eq!(sent["analyzer_config"]["entities"], json!(["PERSON"]));
}

#[tokio::test]
async fn test_integrate_wrong_entities_type_reports_body_error() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 0).await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;

    let response = http()
        .post(format!("{}/integrate", base))
        .json(&json!({ "text": "hello world", "entities": "PERSON" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(body["stage"], "validation");
    assert!(body["details"].as_str().unwrap().contains("entities"));
}

#[tokio::test]
async fn test_submit_log_without_text_redirects() {
    let stages = MockServer::start().await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;

    let response = http()
        .post(format!("{}/submit-log", base))
        .form(&[("log", "")])
        .send()
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/");
    assert!(stages.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_log_renders_result() {
    let stages = MockServer::start().await;
    mount_analyzer(&stages, 1).await;
    mount_anonymizer(&stages, 1).await;
    mount_llm(&stages, completion("No action needed."), 1).await;

    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;
    let response = http()
        .post(format!("{}/submit-log", base))
        .form(&[("log", "My phone is 555-1234")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("My phone is &lt;REDACTED&gt;"));
    assert!(html.contains("No action needed."));
}

#[tokio::test]
async fn test_index_and_health() {
    let stages = MockServer::start().await;
    let base = start_gateway(settings(&stages, StageTimeouts::default())).await;
    let client = http();

    let index = client.get(format!("{}/", base)).send().await.unwrap();
    assert_eq!(index.status(), 200);
    assert!(index.text().await.unwrap().contains("<form"));

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}
