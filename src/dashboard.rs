//! Landing view: how many agents and batches exist.

use log::warn;

use crate::api::ConsoleApi;
use crate::api::models::BatchFilter;

const LOAD_FAILED: &str = "Failed to load dashboard data. Please try again later.";

#[derive(Debug, Default)]
pub struct Dashboard {
    agent_count: Option<usize>,
    batch_count: Option<usize>,
    loading: bool,
    error: Option<String>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_count(&self) -> Option<usize> {
        self.agent_count
    }

    pub fn batch_count(&self) -> Option<usize> {
        self.batch_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub async fn refresh(&mut self, api: &dyn ConsoleApi) {
        self.loading = true;
        let agents = api.list_agents().await;
        let batches = api.list_batches(BatchFilter::All).await;
        self.loading = false;
        match (agents, batches) {
            (Ok(agents), Ok(batches)) => {
                self.agent_count = Some(agents.count);
                self.batch_count = Some(batches.count);
                self.error = None;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!("Failed to load dashboard: {}", err);
                self.error = Some(LOAD_FAILED.to_string());
            }
        }
    }
}
