use crate::agent::{ AgentError, DietAgent };
use crate::cli::Args;
use crate::history::DEFAULT_SESSION_ID;
use crate::llm::LlmError;
use crate::models::api::{ is_valid_session_id, parse_chat_request, ChatReply, ErrorReply, RequestError };

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::{ HeaderMap, HeaderName, HeaderValue, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use log::{ debug, info, error };

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<DietAgent>,
    pub session_header: HeaderName,
}

impl AppState {
    pub fn new(agent: Arc<DietAgent>, session_header: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let session_header = HeaderName::from_bytes(session_header.as_bytes()).map_err(|e|
            format!("Invalid session header name '{}': {}", session_header, e)
        )?;
        Ok(Self { agent, session_header })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

#[derive(Debug)]
pub enum ApiError {
    Request(RequestError),
    Agent(AgentError),
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        ApiError::Agent(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Request(_) => StatusCode::BAD_REQUEST,
            ApiError::Agent(AgentError::Llm(llm)) => match llm {
                LlmError::Auth { .. } => StatusCode::BAD_GATEWAY,
                LlmError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
                LlmError::Transport(_)
                | LlmError::Provider { .. }
                | LlmError::Serialization(_)
                | LlmError::EmptyResponse
                | LlmError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Request(e) => e.to_string(),
            ApiError::Agent(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorReply::new(self.message()))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([state.session_header.clone()]);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    args: &Args,
    state: AppState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()
        .map_err(|e| format!("Invalid server address '{}': {}", args.server_addr, e))?;
    let app = router(state);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("--enable-tls requires both --tls-cert-path and --tls-key-path.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e|
            format!("Failed to bind HTTP server to {}: {}", addr, e)
        )?;
        info!("Starting HTTP server on: http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

fn resolve_session_id(
    body_session: Option<String>,
    headers: &HeaderMap,
    header: &HeaderName,
) -> Result<String, RequestError> {
    if let Some(id) = body_session {
        return Ok(id);
    }
    let Some(value) = headers.get(header) else {
        return Ok(DEFAULT_SESSION_ID.to_string());
    };
    let id = value.to_str().map_err(|_| RequestError::InvalidSessionId)?.trim();
    if id.is_empty() {
        Ok(DEFAULT_SESSION_ID.to_string())
    } else if is_valid_session_id(id) {
        Ok(id.to_string())
    } else {
        Err(RequestError::InvalidSessionId)
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("Received Request Data: {}", String::from_utf8_lossy(&body));

    let request = match parse_chat_request(&body) {
        Ok(r) => r,
        Err(e) => {
            error!("Rejected request: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    let session_id = match resolve_session_id(request.session_id, &headers, &state.session_header) {
        Ok(id) => id,
        Err(e) => {
            error!("Rejected request: {}", e);
            return ApiError::from(e).into_response();
        }
    };

    let mut response = match state.agent.run(&session_id, &request.message).await {
        Ok(reply) => (StatusCode::OK, Json(ChatReply { response: reply })).into_response(),
        Err(e) => {
            error!("Error: {}", e);
            ApiError::from(e).into_response()
        }
    };

    match HeaderValue::from_str(&session_id) {
        Ok(value) => {
            response.headers_mut().insert(state.session_header.clone(), value);
        }
        Err(e) => debug!("Not echoing session id '{}': {}", session_id, e),
    }
    response
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        sessions: state.agent.sessions().len().await,
    })
}
