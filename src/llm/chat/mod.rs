pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use super::{ LlmConfig, LlmError };
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub response: String,
}

/// One blocking round trip to a chat completion provider. Implementations do
/// not retry and do not touch conversation state.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        message: &str
    ) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, LlmError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
