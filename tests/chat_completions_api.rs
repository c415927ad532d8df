//! Integration tests for the OpenAI-compatible /chat/completions endpoint
//!
//! Drives the full router (state, extractor, handler, error mapping) with a
//! scripted provider pool, covering the response envelope, disabled-model
//! fallback, cooldown short-circuits, and request validation.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use hydragate::config::Config;
use hydragate::error::ProviderError;
use hydragate::handlers::{AppState, build_router};
use hydragate::providers::{CompletionStream, Message, Provider};
use futures::stream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted provider: pops one outcome per call, repeats the last one
struct ScriptedProvider {
    name: String,
    models: Vec<String>,
    script: Mutex<VecDeque<Result<String, ()>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(name: &str, models: &[&str], script: Vec<Result<String, ()>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(
        &self,
        _model: &str,
        _messages: &[Message],
        _timeout: Duration,
    ) -> Result<CompletionStream, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().expect("script lock");
        let outcome = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match outcome {
            Some(Ok(text)) => Ok(stream::iter(vec![Ok(text)]).boxed()),
            _ => Err(ProviderError::Connect("scripted failure".to_string())),
        }
    }
}

fn create_test_config() -> Arc<Config> {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 9889

[[providers]]
name = "alpha"
base_url = "http://localhost:8101/v1"
models = ["gpt-4", "gpt-4o"]

[[providers]]
name = "beta"
base_url = "http://localhost:8102/v1"
models = ["gpt-4o"]
"#;
    Arc::new(toml::from_str(toml).expect("should parse test config"))
}

async fn create_test_app(providers: Vec<Arc<ScriptedProvider>>) -> (Router, AppState) {
    let dyn_providers: Vec<Arc<dyn Provider>> = providers
        .into_iter()
        .map(|p| p as Arc<dyn Provider>)
        .collect();
    let state = AppState::with_providers(create_test_config(), dyn_providers)
        .expect("AppState::with_providers should succeed");

    // Mark the whole catalog enabled unless a test says otherwise
    for model in state.orchestrator().catalog().model_names().await {
        state.orchestrator().catalog().record(&model, true, None).await;
    }

    (build_router(state.clone()), state)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn completion_returns_openai_envelope() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("Hi there".into())]);
    let beta = ScriptedProvider::new("beta", &["gpt-4o"], vec![Ok("unused".into())]);
    let (app, _state) = create_test_app(vec![alpha, beta]).await;

    let request = post_json(
        "/chat/completions",
        r#"{"model": "gpt-4", "messages": [{"role": "user", "content": "Hello"}]}"#,
    );
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(json["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(json["object"], "chat.completion");
    assert_eq!(json["model"], "gpt-4");
    assert_eq!(json["choices"][0]["message"]["role"], "assistant");
    assert_eq!(json["choices"][0]["message"]["content"], "Hi there");
    assert_eq!(json["choices"][0]["finish_reason"], "stop");
    assert!(json["usage"]["total_tokens"].is_u64());
    assert!(json["created"].is_i64() || json["created"].is_u64());
}

#[tokio::test(start_paused = true)]
async fn one_failure_then_failover_still_returns_stop() {
    use tower::ServiceExt;

    // alpha throws once; beta serves. Registry ends with exactly one stamp.
    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Err(())]);
    let beta = ScriptedProvider::new("beta", &["gpt-4o"], vec![Ok("recovered".into())]);
    let (app, state) = create_test_app(vec![alpha.clone(), beta]).await;

    let request = post_json(
        "/chat/completions",
        r#"{"model": "gpt-4", "messages": [{"role": "user", "content": "Hello"}]}"#,
    );
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["choices"][0]["finish_reason"], "stop");
    assert_eq!(json["choices"][0]["message"]["content"], "recovered");

    assert_eq!(alpha.calls(), 1);
    let registry = state.orchestrator().selector().registry();
    assert_eq!(registry.failure_count(), 1);
    assert!(registry.last_failure("alpha").is_some());
    assert!(registry.last_failure("beta").is_none());
}

#[tokio::test]
async fn disabled_model_is_served_by_fallback_and_reported() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("substituted".into())]);
    let (app, state) = create_test_app(vec![alpha]).await;

    let catalog = state.orchestrator().catalog();
    catalog.record("gpt-4", false, None).await;
    catalog
        .record("gpt-4o", true, Some(Duration::from_millis(80)))
        .await;

    let request = post_json(
        "/chat/completions",
        r#"{"model": "gpt-4", "messages": [{"role": "user", "content": "Hello"}]}"#,
    );
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model"], "gpt-4o");
}

#[tokio::test]
async fn all_providers_cooling_down_is_503_without_provider_calls() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("never".into())]);
    let beta = ScriptedProvider::new("beta", &["gpt-4o"], vec![Ok("never".into())]);
    let (app, state) = create_test_app(vec![alpha.clone(), beta.clone()]).await;

    let registry = state.orchestrator().selector().registry();
    registry.mark_failed("alpha");
    registry.mark_failed("beta");

    let request = post_json(
        "/chat/completions",
        r#"{"model": "gpt-4", "messages": [{"role": "user", "content": "Hello"}]}"#,
    );
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert!(json["error"].is_string());

    assert_eq!(alpha.calls(), 0);
    assert_eq!(beta.calls(), 0);
}

#[tokio::test]
async fn empty_conversation_is_rejected_with_400() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("never".into())]);
    let (app, _state) = create_test_app(vec![alpha.clone()]).await;

    let request = post_json("/chat/completions", r#"{"messages": []}"#);
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(
        json["error"].as_str().unwrap().contains("messages"),
        "error should mention messages, got: {}",
        json["error"]
    );
    assert_eq!(alpha.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected_with_error_field() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("never".into())]);
    let (app, _state) = create_test_app(vec![alpha]).await;

    let request = post_json("/chat/completions", "{not json");
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn system_field_reaches_the_provider_prefixed() {
    use tower::ServiceExt;

    // Provider that records the conversation it was given
    struct RecordingProvider {
        name: String,
        models: Vec<String>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn models(&self) -> &[String] {
            &self.models
        }

        async fn complete(
            &self,
            _model: &str,
            messages: &[Message],
            _timeout: Duration,
        ) -> Result<CompletionStream, ProviderError> {
            self.seen
                .lock()
                .expect("seen lock")
                .push(messages.to_vec());
            Ok(stream::iter(vec![Ok("ok".to_string())]).boxed())
        }
    }

    let recorder = Arc::new(RecordingProvider {
        name: "alpha".to_string(),
        models: vec!["gpt-4".to_string(), "gpt-4o".to_string()],
        seen: Mutex::new(Vec::new()),
    });
    let state = AppState::with_providers(create_test_config(), vec![recorder.clone()])
        .expect("state should build");
    for model in state.orchestrator().catalog().model_names().await {
        state.orchestrator().catalog().record(&model, true, None).await;
    }
    let app = build_router(state);

    let request = post_json(
        "/chat/completions",
        r#"{
            "model": "gpt-4",
            "system": "You are terse",
            "messages": [{"role": "user", "content": "Hello"}]
        }"#,
    );
    let response = app.oneshot(request).await.expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);

    let seen = recorder.seen.lock().expect("seen lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 2);
    assert_eq!(seen[0][0].role, hydragate::providers::Role::System);
    assert_eq!(seen[0][0].content, "You are terse");
    assert_eq!(seen[0][1].content, "Hello");
}

#[tokio::test]
async fn models_endpoint_serves_cache_contents() {
    use tower::ServiceExt;

    let alpha = ScriptedProvider::new("alpha", &["gpt-4", "gpt-4o"], vec![Ok("never".into())]);
    let (app, state) = create_test_app(vec![alpha]).await;

    state
        .orchestrator()
        .catalog()
        .record("gpt-4o", true, Some(Duration::from_millis(120)))
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/models")
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("request should succeed");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["object"], "list");

    let data = json["data"].as_array().expect("data should be an array");
    assert_eq!(data.len(), 2);
    let gpt4o = data
        .iter()
        .find(|m| m["id"] == "gpt-4o")
        .expect("gpt-4o should be listed");
    assert_eq!(gpt4o["object"], "model");
    assert_eq!(gpt4o["state"], "enabled");
    assert_eq!(gpt4o["latency_ms"], 120);
}
