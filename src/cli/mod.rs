use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API Key for the chat completion provider. Required; the server refuses to start without it.
    #[arg(long, env = "OPENAI_API_KEY", value_parser = parse_api_key)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o-mini, gpt-4o)
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,

    /// Base URL for the chat completion API. The client appends /v1/chat/completions.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.openai.com")]
    pub chat_base_url: String,

    /// Sampling temperature sent to the provider. Provider default when unset.
    #[arg(long, env = "CHAT_TEMPERATURE")]
    pub chat_temperature: Option<f32>,

    // --- Prompt Args ---
    /// Optional JSON file overriding the built-in system prompt sections.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// First assistant message seeded into every new conversation.
    #[arg(
        long,
        env = "GREETING",
        default_value = "Hello! I am your diet assistant. Ask me anything about nutrition and healthy eating."
    )]
    pub greeting: String,

    // --- History / Session Args ---
    /// Number of most recent stored messages sent to the provider. 0 sends the whole conversation.
    #[arg(long, env = "HISTORY_WINDOW", default_value = "0")]
    pub history_window: usize,

    /// Request header carrying the conversation identifier.
    #[arg(long, env = "SESSION_HEADER", default_value = "x-session-id")]
    pub session_header: String,

    /// Idle time in seconds after which a conversation is dropped. 0 means never.
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "3600")]
    pub session_ttl_secs: u64,

    /// Maximum number of conversations kept in memory.
    #[arg(long, env = "MAX_SESSIONS", default_value = "1000")]
    pub max_sessions: usize,

    /// Interval in seconds between sweeps for expired conversations.
    #[arg(long, env = "SESSION_SWEEP_SECS", default_value = "60")]
    pub session_sweep_secs: u64,

    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:5000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

fn parse_api_key(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(
            "API key is not set. Please set the API key in the environment variable OPENAI_API_KEY."
                .to_string(),
        );
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_key_given() {
        let args = Args::try_parse_from(["diet-chat", "--chat-api-key", "sk-test"]).unwrap();
        assert_eq!(args.chat_api_key, "sk-test");
        assert_eq!(args.chat_model, "gpt-4o-mini");
        assert_eq!(args.server_addr, "127.0.0.1:5000");
        assert_eq!(args.history_window, 0);
        assert_eq!(args.session_header, "x-session-id");
        assert!(!args.enable_tls);
    }

    #[test]
    fn blank_key_is_rejected() {
        let result = Args::try_parse_from(["diet-chat", "--chat-api-key", "   "]);
        assert!(result.is_err());
    }

    #[test]
    fn absent_key_is_rejected() {
        // Only meaningful when the key is not exported in the test environment.
        if std::env::var_os("OPENAI_API_KEY").is_some() {
            return;
        }
        let err = Args::try_parse_from(["diet-chat"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
