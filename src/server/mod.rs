pub mod api;

use crate::agent::DietAgent;
use crate::cli::Args;
use crate::history::spawn_sweeper;
use self::api::AppState;
use log::info;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    agent: Arc<DietAgent>,
    args: Args,
}

impl Server {
    pub fn new(agent: Arc<DietAgent>, args: Args) -> Self {
        Self { agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let state = AppState::new(self.agent.clone(), &self.args.session_header)?;

        if self.args.session_ttl_secs > 0 && self.args.session_sweep_secs > 0 {
            info!(
                "Sweeping sessions idle for more than {}s every {}s",
                self.args.session_ttl_secs,
                self.args.session_sweep_secs
            );
            spawn_sweeper(
                self.agent.sessions().clone(),
                Duration::from_secs(self.args.session_sweep_secs)
            );
        }

        api::start_http_server(&self.args, state).await
    }
}
