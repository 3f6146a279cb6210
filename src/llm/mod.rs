pub mod chat;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub completion_model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            completion_model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: None,
        }
    }
}

/// Failure of a single provider call, tagged by what went wrong.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Provider rejected the credentials ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("Provider request failed: {0}")]
    Transport(String),
    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("Failed to decode provider response: {0}")]
    Serialization(String),
    #[error("No response from provider")]
    EmptyResponse,
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Classifies a non-success provider status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => LlmError::Auth { status, message },
            429 => LlmError::RateLimit(message),
            _ => LlmError::Provider { status, message },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Serialization(err.to_string())
        } else if let Some(status) = err.status() {
            LlmError::from_status(status.as_u16(), err.to_string())
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
