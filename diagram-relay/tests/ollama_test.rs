mod common;

use axum::http::StatusCode;
use common::{test_config, unused_address, FakeOllama, FakeReply, TestApp};
use diagram_relay::config::BackendConfig;
use diagram_relay::models::build_conversation;
use diagram_relay::services::readiness;
use diagram_relay::services::{ChatProvider, OllamaProvider, ProviderError};
use diagram_relay::startup::Application;
use serde_json::Value;
use std::time::Duration;

fn provider_for(base_url: &str) -> OllamaProvider {
    OllamaProvider::new(&BackendConfig {
        base_url: base_url.to_string(),
        model: "mistral".to_string(),
        request_timeout_secs: 10,
        pull_timeout_secs: None,
    })
    .expect("Failed to build provider")
}

#[tokio::test]
async fn chat_sends_non_streaming_request_and_returns_content() {
    let fake = FakeOllama::new(
        FakeReply::Content("graph TD\nA-->B".to_string()),
        &["mistral:latest"],
    );
    let base_url = fake.serve().await;
    let provider = provider_for(&base_url);

    let content = provider
        .chat("mistral", &build_conversation("user login flow"))
        .await
        .unwrap();

    assert_eq!(content, "graph TD\nA-->B");

    let requests = fake.chat_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["model"], "mistral");
    assert_eq!(request["stream"], false);
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][1]["role"], "user");
    assert_eq!(
        request["messages"][1]["content"],
        "Create a flowchart for: user login flow"
    );
}

#[tokio::test]
async fn backend_error_body_becomes_api_error() {
    let fake = FakeOllama::new(
        FakeReply::Failure(
            StatusCode::NOT_FOUND,
            "model \"mistral\" not found, try pulling it first".to_string(),
        ),
        &[],
    );
    let base_url = fake.serve().await;

    let err = provider_for(&base_url)
        .chat("mistral", &build_conversation("x"))
        .await
        .unwrap_err();

    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("try pulling it first"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let base_url = unused_address().await;

    let err = provider_for(&base_url).health_check().await.unwrap_err();

    assert!(matches!(err, ProviderError::Unavailable(_)));
}

#[tokio::test]
async fn list_and_pull_models() {
    let fake = FakeOllama::new(FakeReply::Content(String::new()), &["llama3:8b"]);
    let base_url = fake.serve().await;
    let provider = provider_for(&base_url);

    assert_eq!(provider.list_models().await.unwrap(), vec!["llama3:8b"]);

    provider.pull_model("mistral").await.unwrap();

    let pulls = fake.pull_requests();
    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0]["model"], "mistral");
    assert_eq!(pulls[0]["stream"], false);
    assert!(provider
        .list_models()
        .await
        .unwrap()
        .contains(&"mistral:latest".to_string()));
}

#[tokio::test]
async fn slow_pull_outlasts_request_timeout() {
    let fake = FakeOllama::new(FakeReply::Content(String::new()), &[]);
    fake.set_pull_delay(Duration::from_secs(3));
    let base_url = fake.serve().await;

    let mut config = test_config(&base_url);
    config.backend.request_timeout_secs = 1;
    config.readiness.enabled = true;
    let provider = OllamaProvider::new(&config.backend).expect("Failed to build provider");

    readiness::bootstrap(&provider, "mistral", &config.readiness)
        .await
        .expect("pull should not be cut off by the chat request timeout");

    assert_eq!(fake.pull_requests().len(), 1);
    assert!(provider
        .list_models()
        .await
        .unwrap()
        .contains(&"mistral:latest".to_string()));
}

#[tokio::test]
async fn pull_timeout_bounds_a_stalled_pull() {
    let fake = FakeOllama::new(FakeReply::Content(String::new()), &[]);
    fake.set_pull_delay(Duration::from_secs(5));
    let base_url = fake.serve().await;

    let provider = OllamaProvider::new(&BackendConfig {
        base_url,
        model: "mistral".to_string(),
        request_timeout_secs: 10,
        pull_timeout_secs: Some(1),
    })
    .expect("Failed to build provider");

    let err = provider.pull_model("mistral").await.unwrap_err();

    assert!(matches!(err, ProviderError::Unavailable(ref msg) if msg.contains("timed out")));
}

#[tokio::test]
async fn startup_pulls_missing_model_then_serves_requests() {
    let fake = FakeOllama::new(FakeReply::Content("graph TD\nA-->B".to_string()), &[]);
    let base_url = fake.serve().await;

    let mut config = test_config(&base_url);
    config.readiness.enabled = true;

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    assert_eq!(fake.pull_requests().len(), 1);

    let app = TestApp::start(app).await;
    let response = app.post_generate(r#"{"prompt":"user login flow"}"#).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["mermaid_code"], "graph TD\nA-->B");
    assert_eq!(fake.chat_requests().len(), 1);
}

#[tokio::test]
async fn startup_fails_when_backend_never_becomes_ready() {
    let base_url = unused_address().await;

    let mut config = test_config(&base_url);
    config.readiness.enabled = true;
    config.readiness.max_elapsed_secs = 1;

    let result = Application::build(config).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn backend_outage_after_startup_returns_500() {
    let base_url = unused_address().await;
    let app = Application::build(test_config(&base_url))
        .await
        .expect("Failed to build application");
    let app = TestApp::start(app).await;

    let response = app.post_generate(r#"{"prompt":"user login flow"}"#).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Backend unavailable"));
}
