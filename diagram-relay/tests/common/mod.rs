#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use diagram_relay::config::{BackendConfig, GenerationConfig, ReadinessConfig, RelayConfig};
use diagram_relay::services::ChatProvider;
use diagram_relay::startup::Application;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Relay settings for tests: random port, no readiness wait.
pub fn test_config(backend_url: &str) -> RelayConfig {
    RelayConfig {
        common: CoreConfig {
            host: LOCALHOST,
            port: 0,
            ..CoreConfig::default()
        },
        backend: BackendConfig {
            base_url: backend_url.to_string(),
            model: "mistral".to_string(),
            request_timeout_secs: 10,
            pull_timeout_secs: None,
        },
        readiness: ReadinessConfig {
            enabled: false,
            initial_interval_ms: 10,
            max_interval_ms: 50,
            max_elapsed_secs: 2,
            pull_missing_model: true,
        },
        generation: GenerationConfig {
            require_prompt: false,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(provider: Arc<dyn ChatProvider>) -> Self {
        Self::spawn_with(test_config("http://127.0.0.1:9"), provider).await
    }

    pub async fn spawn_with(config: RelayConfig, provider: Arc<dyn ChatProvider>) -> Self {
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    pub async fn start(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_generate(&self, body: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/generate", self.address))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// Canned behaviour of the fake Ollama server's chat endpoint.
#[derive(Clone)]
pub enum FakeReply {
    Content(String),
    Failure(StatusCode, String),
}

/// In-process stand-in for an Ollama server.
pub struct FakeOllama {
    pub reply: Mutex<FakeReply>,
    pub models: Mutex<Vec<String>>,
    pub chat_requests: Mutex<Vec<Value>>,
    pub pull_requests: Mutex<Vec<Value>>,
    /// How long `/api/pull` takes before answering.
    pub pull_delay: Mutex<Duration>,
}

impl FakeOllama {
    pub fn new(reply: FakeReply, models: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            models: Mutex::new(models.iter().map(|m| m.to_string()).collect()),
            chat_requests: Mutex::new(Vec::new()),
            pull_requests: Mutex::new(Vec::new()),
            pull_delay: Mutex::new(Duration::ZERO),
        })
    }

    /// Serve on a random local port and return the base URL.
    pub async fn serve(self: &Arc<Self>) -> String {
        let router = Router::new()
            .route("/api/chat", post(fake_chat))
            .route("/api/tags", get(fake_tags))
            .route("/api/pull", post(fake_pull))
            .with_state(self.clone());

        let listener = TcpListener::bind((LOCALHOST, 0))
            .await
            .expect("Failed to bind fake Ollama");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        format!("http://127.0.0.1:{}", port)
    }

    pub fn set_pull_delay(&self, delay: Duration) {
        *self.pull_delay.lock().unwrap() = delay;
    }

    pub fn chat_requests(&self) -> Vec<Value> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn pull_requests(&self) -> Vec<Value> {
        self.pull_requests.lock().unwrap().clone()
    }
}

async fn fake_chat(State(fake): State<Arc<FakeOllama>>, Json(body): Json<Value>) -> Response {
    fake.chat_requests.lock().unwrap().push(body.clone());

    let reply = fake.reply.lock().unwrap().clone();
    match reply {
        FakeReply::Content(content) => Json(json!({
            "model": body["model"],
            "created_at": "2024-05-01T12:00:00Z",
            "message": { "role": "assistant", "content": content },
            "done": true,
            "total_duration": 1234
        }))
        .into_response(),
        FakeReply::Failure(status, message) => {
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}

async fn fake_tags(State(fake): State<Arc<FakeOllama>>) -> Json<Value> {
    let models: Vec<Value> = fake
        .models
        .lock()
        .unwrap()
        .iter()
        .map(|name| json!({ "name": name, "size": 4_109_865_159u64 }))
        .collect();
    Json(json!({ "models": models }))
}

async fn fake_pull(State(fake): State<Arc<FakeOllama>>, Json(body): Json<Value>) -> Json<Value> {
    fake.pull_requests.lock().unwrap().push(body.clone());

    let delay = *fake.pull_delay.lock().unwrap();
    tokio::time::sleep(delay).await;

    if let Some(model) = body["model"].as_str() {
        fake.models.lock().unwrap().push(format!("{}:latest", model));
    }
    Json(json!({ "status": "success" }))
}

/// A local address nothing listens on.
pub async fn unused_address() -> String {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
