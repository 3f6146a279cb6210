use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request. JSON must contain 'message'.";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorReply {
    pub error: String,
}

impl ErrorReply {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid request. JSON must contain 'message'.")]
    MissingMessage,
    #[error("Invalid request. 'session_id' must be 1-128 visible ASCII characters.")]
    InvalidSessionId,
}

/// Session ids are echoed back in a response header, so they are limited to
/// visible ASCII.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_SESSION_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Validates a raw `/chat` body. Any body that is not a JSON object carrying a
/// string `message` is rejected with the same error; an optional `session_id`
/// must pass `is_valid_session_id`.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, RequestError> {
    let value: JsonValue = serde_json::from_slice(body).map_err(|_| RequestError::MissingMessage)?;
    let object = value.as_object().ok_or(RequestError::MissingMessage)?;

    let message = match object.get("message") {
        Some(JsonValue::String(s)) => s.clone(),
        _ => return Err(RequestError::MissingMessage),
    };

    let session_id = match object.get("session_id") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) if s.trim().is_empty() => None,
        Some(JsonValue::String(s)) if is_valid_session_id(s.trim()) => Some(s.trim().to_string()),
        Some(_) => return Err(RequestError::InvalidSessionId),
    };

    Ok(ChatRequest { message, session_id })
}
