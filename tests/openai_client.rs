//! Exercises the OpenAI chat client against a local axum server that
//! imitates the chat completions endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use diet_chat::llm::chat::openai::OpenAIChatClient;
use diet_chat::llm::chat::ChatClient;
use diet_chat::llm::{LlmConfig, LlmError};
use diet_chat::models::chat::{ChatMessage, Role};
use serde_json::{json, Value};

#[derive(Clone)]
struct FakeProvider {
    status: StatusCode,
    body: Value,
    captured: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn completions(
    State(provider): State<FakeProvider>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    provider.captured.lock().unwrap().push((auth, request));
    (provider.status, Json(provider.body.clone()))
}

async fn spawn_provider(provider: FakeProvider) -> SocketAddr {
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> OpenAIChatClient {
    let config = LlmConfig {
        api_key: "sk-test".to_string(),
        completion_model: "gpt-4o-mini".to_string(),
        base_url: format!("http://{addr}"),
        temperature: None,
    };
    OpenAIChatClient::from_config(&config).unwrap()
}

fn provider(status: StatusCode, body: Value) -> FakeProvider {
    FakeProvider {
        status,
        body,
        captured: Arc::new(Mutex::new(Vec::new())),
    }
}

#[tokio::test]
async fn sends_system_history_and_user_message() {
    let fake = provider(
        StatusCode::OK,
        json!({"choices": [{"message": {"role": "assistant", "content": "Try oats with fruit."}}]}),
    );
    let captured = fake.captured.clone();
    let addr = spawn_provider(fake).await;
    let client = client_for(addr);

    let history = vec![ChatMessage::new(Role::Assistant, "Hello!")];
    let reply = client
        .complete("SYSTEM PROMPT", &history, "What should I eat for breakfast?")
        .await
        .unwrap();
    assert_eq!(reply.response, "Try oats with fruit.");

    let captured = captured.lock().unwrap();
    let (auth, request) = &captured[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(request["model"], "gpt-4o-mini");
    assert!(request.get("temperature").is_none());
    assert_eq!(
        request["messages"],
        json!([
            {"role": "system", "content": "SYSTEM PROMPT"},
            {"role": "assistant", "content": "Hello!"},
            {"role": "user", "content": "What should I eat for breakfast?"}
        ])
    );
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let addr = spawn_provider(provider(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
    ))
    .await;

    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    match err {
        LlmError::Auth { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limit() {
    let addr = spawn_provider(provider(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "Rate limit reached"}}),
    ))
    .await;

    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimit(ref m) if m == "Rate limit reached"));
}

#[tokio::test]
async fn server_error_keeps_status() {
    let addr = spawn_provider(provider(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"message": "overloaded"}}),
    ))
    .await;

    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::Provider { status: 503, .. }));
}

#[tokio::test]
async fn missing_choices_is_empty_response() {
    let addr = spawn_provider(provider(StatusCode::OK, json!({"choices": []}))).await;
    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn unexpected_shape_is_serialization_error() {
    let addr = spawn_provider(provider(StatusCode::OK, json!({"unexpected": true}))).await;
    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::Serialization(_)));
}

#[tokio::test]
async fn unreachable_provider_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::Transport(_)), "got {err:?}");
}

/// Accepts one connection, reads the request, then answers with an error
/// status whose body is cut short of its declared length.
async fn spawn_truncating_provider() -> SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"err",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    addr
}

#[tokio::test]
async fn truncated_error_body_is_transport_error() {
    let addr = spawn_truncating_provider().await;
    let err = client_for(addr).complete("s", &[], "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::Transport(ref m) if m.contains("500")), "got {err:?}");
}
