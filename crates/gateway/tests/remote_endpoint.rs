use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use context_gateway::{GatewayConfig, GatewayError, ModelGateway, SYSTEM_INSTRUCTION};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone)]
struct FakeEndpoint {
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    status: StatusCode,
    body: Value,
}

impl FakeEndpoint {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            status,
            body,
        }
    }

    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(fake): State<FakeEndpoint>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    fake.seen.lock().unwrap().push((auth, body));
    (fake.status, Json(fake.body.clone()))
}

async fn spawn_endpoint(fake: FakeEndpoint) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/v1")
}

fn config(base_url: String, api_key: Option<&str>) -> GatewayConfig {
    GatewayConfig {
        api_key: api_key.map(str::to_string),
        base_url,
        model: "test/model".to_string(),
    }
}

fn project() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(temp.path().join("sub")).expect("mkdir");
    std::fs::write(temp.path().join("a.js"), "let x=1;").expect("write a.js");
    std::fs::write(temp.path().join("sub").join("b.js"), "let y=2;").expect("write b.js");
    temp
}

fn answer(text: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
}

#[tokio::test]
async fn round_trip_through_chat_completions() {
    let temp = project();
    let fake = FakeEndpoint::new(StatusCode::OK, answer("Both files declare a variable."));
    let base_url = spawn_endpoint(fake.clone()).await;
    let gateway =
        ModelGateway::from_config(temp.path(), &config(base_url, Some("test-key"))).unwrap();

    let response = gateway
        .send(
            "What do these do?",
            &["sub/b.js".to_string(), "a.js".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(response, "Both files declare a variable.");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "test/model");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_INSTRUCTION);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(2));

    let user = body["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("What do these do?\n\n"));
    let b = user.find("File: sub/b.js").unwrap();
    let a = user.find("File: a.js").unwrap();
    assert!(b < a, "sections must follow selection order");
}

#[tokio::test]
async fn missing_credential_never_reaches_the_network() {
    let temp = project();
    let fake = FakeEndpoint::new(StatusCode::OK, answer("unused"));
    let base_url = spawn_endpoint(fake.clone()).await;
    let gateway = ModelGateway::from_config(temp.path(), &config(base_url, None)).unwrap();

    let err = gateway
        .send("Explain", &["a.js".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotConfigured), "{err:?}");
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn unreadable_selection_sends_nothing() {
    let temp = project();
    let fake = FakeEndpoint::new(StatusCode::OK, answer("unused"));
    let base_url = spawn_endpoint(fake.clone()).await;
    let gateway = ModelGateway::from_config(temp.path(), &config(base_url, Some("k"))).unwrap();

    let err = gateway
        .send("Explain", &["a.js".to_string(), "nope.js".to_string()])
        .await
        .unwrap_err();
    match err {
        GatewayError::FileRead { ref path, .. } => assert_eq!(path, "nope.js"),
        other => panic!("expected FileRead, got {other:?}"),
    }
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn non_success_status_is_remote_error() {
    let temp = project();
    let fake = FakeEndpoint::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "upstream exploded" } }),
    );
    let base_url = spawn_endpoint(fake).await;
    let gateway = ModelGateway::from_config(temp.path(), &config(base_url, Some("k"))).unwrap();

    let err = gateway
        .send("Explain", &["a.js".to_string()])
        .await
        .unwrap_err();
    match err {
        GatewayError::Remote { status, message } => {
            assert_eq!(status, Some(500));
            assert!(message.contains("upstream exploded"), "{message}");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_answer_field_is_malformed() {
    let temp = project();
    let fake = FakeEndpoint::new(StatusCode::OK, json!({ "choices": [] }));
    let base_url = spawn_endpoint(fake).await;
    let gateway = ModelGateway::from_config(temp.path(), &config(base_url, Some("k"))).unwrap();

    let err = gateway
        .send("Explain", &["a.js".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_endpoint_is_remote_error() {
    let temp = project();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = ModelGateway::from_config(
        temp.path(),
        &config(format!("http://{addr}/v1"), Some("k")),
    )
    .unwrap();
    let err = gateway
        .send("Explain", &["a.js".to_string()])
        .await
        .unwrap_err();
    assert!(
        matches!(err, GatewayError::Remote { status: None, .. }),
        "{err:?}"
    );
}
