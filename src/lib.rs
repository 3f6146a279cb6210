pub mod agent;
pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use agent::DietAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!(
        "History Window: {}",
        if args.history_window == 0 { "full conversation".to_string() } else { args.history_window.to_string() }
    );
    info!("Session Header: {}", args.session_header);
    info!("Session TTL (s): {}", args.session_ttl_secs);
    info!("Max Sessions: {}", args.max_sessions);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(DietAgent::new(&args)?);
    let server = Server::new(agent, args);
    server.run().await?;

    Ok(())
}
