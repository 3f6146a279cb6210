use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError };
use crate::models::chat::ChatMessage;

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize, Debug)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorEnvelope {
    error: OpenAIErrorBody,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    message: String,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: &str,
        model: String,
        base_url: String,
        temperature: Option<f32>
    ) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            http,
            model,
            base_url,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Config("OpenAI API key is required".to_string()));
        }

        Self::new(
            &config.api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature,
        )
    }

    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1/chat/completions") {
            base.to_string()
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    fn build_messages(
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str
    ) -> Vec<OpenAIMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        messages.extend(
            history.iter().map(|msg| OpenAIMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
        );
        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });
        messages
    }
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw text.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str
    ) -> Result<CompletionResponse, LlmError> {
        let url = self.endpoint();
        let req = OpenAIChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(system_prompt, history, message),
            temperature: self.temperature,
        };
        debug!("Sending {} messages to {} ({})", req.messages.len(), url, self.model);

        let resp = self.http.post(&url).json(&req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.map_err(|e|
                LlmError::Transport(format!("failed to read error body for status {}: {}", status, e))
            )?;
            return Err(LlmError::from_status(status.as_u16(), provider_error_message(&body)));
        }

        let body = resp.bytes().await?;
        let parsed: OpenAIResponse = serde_json::from_slice(&body)?;

        let content = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(CompletionResponse { response: content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
