use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::history::SessionStore;
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::llm::{ LlmConfig, LlmError };
use crate::models::chat::{ ChatMessage, Role };

use log::{ info, error };
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Diet assistant: the fixed system prompt plus per-session conversation
/// memory in front of a chat completion client.
#[derive(Clone)]
pub struct DietAgent {
    chat_client: Arc<dyn ChatClient>,
    system_prompt: Arc<str>,
    sessions: Arc<SessionStore>,
    history_window: usize,
}

impl DietAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let chat_config = LlmConfig {
            api_key: args.chat_api_key.clone(),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            temperature: args.chat_temperature,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Model={}, BaseURL={}",
            chat_config.completion_model,
            chat_config.base_url
        );

        let prompt_config = prompt::resolve_prompt_config(args.prompts_path.as_deref()).map_err(|e|
            format!(
                "Failed to load prompts from '{}': {}",
                args.prompts_path.as_deref().unwrap_or("built-in"),
                e
            )
        )?;

        let ttl = if args.session_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.session_ttl_secs))
        };
        let sessions = Arc::new(SessionStore::new(args.greeting.clone(), ttl, args.max_sessions));

        Ok(Self::with_client(chat_client, &prompt_config, sessions, args.history_window))
    }

    pub fn with_client(
        chat_client: Arc<dyn ChatClient>,
        prompt_config: &PromptConfig,
        sessions: Arc<SessionStore>,
        history_window: usize
    ) -> Self {
        Self {
            chat_client,
            system_prompt: Arc::from(prompt_config.generate()),
            sessions,
            history_window,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Runs one turn for `session_id`. The session stays locked for the whole
    /// provider call; memory grows by user + assistant only when the call succeeds.
    pub async fn run(&self, session_id: &str, message: &str) -> Result<String, AgentError> {
        let memory = self.sessions.get_or_create(session_id).await;
        let mut memory = memory.lock().await;

        let history: Vec<ChatMessage> = memory.window(self.history_window).to_vec();
        info!(
            "Session '{}': sending {} history message(s) to {}",
            session_id,
            history.len(),
            self.chat_client.get_model()
        );

        let reply = match self.chat_client.complete(&self.system_prompt, &history, message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Session '{}': model call failed: {}", session_id, e);
                return Err(e.into());
            }
        };

        memory.add_message(Role::User, message);
        memory.add_message(Role::Assistant, reply.response.clone());

        Ok(reply.response)
    }
}
