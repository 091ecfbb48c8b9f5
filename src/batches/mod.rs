//! Batch lifecycle view: upload, filter, inspect, transition and delete list
//! batches.
//!
//! The cached batch list is only ever replaced by a fresh fetch. Mutations
//! never edit it in place; they re-fetch once the server confirms.

pub mod distribution;
pub mod status;

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};

use crate::api::ConsoleApi;
use crate::api::models::{Agent, Batch, BatchFilter, BatchStatus, ListItem, ListUpload};
use crate::confirm::Confirmation;
use crate::validation::{self, FieldError};

pub use distribution::{AGENTS_PER_BATCH, Distribution, Share};
pub use status::{BatchAction, actions, can_delete};

/// Agents that must exist before a list can be distributed.
pub const MIN_AGENTS_FOR_UPLOAD: usize = AGENTS_PER_BATCH;

const FETCH_FAILED: &str = "Failed to fetch list batches. Please try again later.";
const DETAILS_FAILED: &str = "Failed to fetch batch details. Please try again later.";
const UPLOAD_FAILED: &str = "Failed to upload file. Please try again.";
const UPLOAD_DONE: &str = "File uploaded and tasks distributed successfully!";
const DELETE_FAILED: &str = "Failed to delete batch. Please try again later.";
const DELETE_DONE: &str = "Batch deleted successfully!";
const AGENT_ITEMS_FAILED: &str = "Failed to fetch list items for agent. Please try again later.";
const AGENTS_FAILED: &str = "Failed to fetch agents. Please try again later.";
const NO_AGENTS: &str = "No agents found. Please add agents first.";
const AGENTS_NOT_LOADED: &str = "Agents are not loaded yet. Refresh the list and try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Please add {missing} more agent(s) before uploading.")]
    NotEnoughAgents { missing: usize },
    #[error("{}", AGENTS_NOT_LOADED)]
    AgentsNotLoaded,
    #[error("{0}")]
    Invalid(FieldError),
    #[error("{0}")]
    Rejected(String),
}

/// Items of one batch plus the partition annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDetails {
    pub batch_id: String,
    pub batch: Option<Batch>,
    pub items: Vec<ListItem>,
    pub distribution: Distribution,
}

/// At most one row menu is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMenu {
    pub open_row: Option<String>,
    pub cursor: usize,
}

impl RowMenu {
    pub fn toggle(&mut self, batch_id: &str) {
        if self.is_open(batch_id) {
            self.close();
        } else {
            self.open_row = Some(batch_id.to_string());
            self.cursor = 0;
        }
    }

    pub fn close(&mut self) {
        self.open_row = None;
        self.cursor = 0;
    }

    pub fn is_open(&self, batch_id: &str) -> bool {
        self.open_row.as_deref() == Some(batch_id)
    }
}

#[derive(Debug, Default)]
pub struct BatchBoard {
    batches: Vec<Batch>,
    count: usize,
    filter: BatchFilter,
    selected: usize,
    loading: bool,
    uploading: bool,
    error: Option<String>,
    agents_error: Option<String>,
    notice: Option<String>,
    details: Option<BatchDetails>,
    agents: Vec<Agent>,
    agents_loaded: bool,
    agent_items: HashMap<String, Vec<ListItem>>,
    selected_agent: Option<Agent>,
    pub row_menu: RowMenu,
    pending_delete: Confirmation<Batch>,
}

impl BatchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    // --- read side ---

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn filter(&self) -> BatchFilter {
        self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// True while any request issued by this view is outstanding.
    pub fn is_busy(&self) -> bool {
        self.loading || self.uploading || self.pending_delete.is_committing()
    }

    /// The banner text. A batch-side error wins over a failed roster fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().or(self.agents_error.as_deref())
    }

    pub fn agents_loaded(&self) -> bool {
        self.agents_loaded
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn details(&self) -> Option<&BatchDetails> {
        self.details.as_ref()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        self.selected_agent.as_ref()
    }

    pub fn agent_items(&self, agent_id: &str) -> Option<&[ListItem]> {
        self.agent_items.get(agent_id).map(Vec::as_slice)
    }

    pub fn pending_delete(&self) -> &Confirmation<Batch> {
        &self.pending_delete
    }

    pub fn empty_message(&self) -> String {
        match self.filter.status() {
            None => String::from("No list batches found. Upload a file to create a new batch."),
            Some(status) => format!("No {status} batches found."),
        }
    }

    pub fn selected(&self) -> Option<&Batch> {
        self.batches.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.batches.is_empty() {
            self.selected = (self.selected + 1).min(self.batches.len() - 1);
            self.row_menu.close();
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.row_menu.close();
    }

    /// Actions for the row whose menu is open.
    pub fn open_menu_actions(&self) -> Vec<BatchAction> {
        self.row_menu
            .open_row
            .as_deref()
            .and_then(|id| self.batches.iter().find(|b| b.batch_id == id))
            .map(|batch| actions(batch.status))
            .unwrap_or_default()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
        self.agents_error = None;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    pub fn close_agent_items(&mut self) {
        self.selected_agent = None;
    }

    // --- upload gate ---

    /// Refuses uploads until enough agents exist to share the list.
    pub fn upload_gate(agent_count: usize) -> Result<(), UploadError> {
        if agent_count >= MIN_AGENTS_FOR_UPLOAD {
            Ok(())
        } else {
            Err(UploadError::NotEnoughAgents {
                missing: MIN_AGENTS_FOR_UPLOAD - agent_count,
            })
        }
    }

    /// The gate applied to this view's roster. Without a loaded roster the
    /// agent count is unknown, so no count is reported.
    pub fn check_upload(&self) -> Result<(), UploadError> {
        if !self.agents_loaded {
            return Err(UploadError::AgentsNotLoaded);
        }
        Self::upload_gate(self.agents.len())
    }

    pub fn can_upload(&self) -> bool {
        self.check_upload().is_ok()
    }

    // --- in-flight markers, set before a queued request runs ---

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub fn mark_uploading(&mut self) {
        self.uploading = true;
    }

    // --- operations ---

    pub async fn refresh(&mut self, api: &dyn ConsoleApi) {
        self.loading = true;
        let outcome = api.list_batches(self.filter).await;
        self.loading = false;
        match outcome {
            Ok(list) => {
                debug!(
                    "Fetched {} batch(es) for filter {}",
                    list.batches.len(),
                    self.filter.label()
                );
                self.batches = list.batches;
                self.count = list.count;
                self.error = None;
                if self.selected >= self.batches.len() {
                    self.selected = self.batches.len().saturating_sub(1);
                }
                if let Some(open) = self.row_menu.open_row.clone()
                    && !self.batches.iter().any(|b| b.batch_id == open)
                {
                    self.row_menu.close();
                }
            }
            Err(err) => {
                warn!("Failed to fetch batches: {}", err);
                self.error = Some(FETCH_FAILED.to_string());
            }
        }
    }

    /// Switches the server-side filter and fetches the matching batches.
    pub async fn set_filter(&mut self, api: &dyn ConsoleApi, filter: BatchFilter) {
        self.filter = filter;
        self.selected = 0;
        self.row_menu.close();
        self.refresh(api).await;
    }

    pub async fn refresh_agents(&mut self, api: &dyn ConsoleApi) {
        match api.list_agents().await {
            Ok(list) => {
                self.agents = list.agents;
                self.agents_loaded = true;
                self.agents_error = None;
            }
            Err(err) => {
                warn!("Failed to fetch agents for batch view: {}", err);
                self.agents_error = Some(AGENTS_FAILED.to_string());
            }
        }
    }

    /// Uploads one contact file. Checks the agent count, then the extension,
    /// then transfers; the batch list is re-fetched after a success.
    pub async fn upload(&mut self, api: &dyn ConsoleApi, path: &Path) -> Result<(), UploadError> {
        if let Err(err) = self.check_upload() {
            self.uploading = false;
            self.error = Some(err.to_string());
            return Err(err);
        }
        if let Err(err) = validation::validate_upload_path(path) {
            self.uploading = false;
            self.error = Some(err.message.clone());
            return Err(UploadError::Invalid(err));
        }

        self.uploading = true;
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(err) => {
                warn!("Failed to read {}: {}", path.display(), err);
                self.uploading = false;
                let message = format!("Could not read {}: {}", path.display(), err);
                self.error = Some(message.clone());
                return Err(UploadError::Rejected(message));
            }
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!("Uploading {} ({} bytes)", file_name, content.len());
        let outcome = api.upload_list(ListUpload::new(file_name, content)).await;
        self.uploading = false;
        match outcome {
            Ok(()) => {
                self.error = None;
                self.notice = Some(UPLOAD_DONE.to_string());
                self.refresh(api).await;
                Ok(())
            }
            Err(err) => {
                warn!("Upload rejected: {}", err);
                let message = err.user_message(UPLOAD_FAILED);
                self.error = Some(message.clone());
                Err(UploadError::Rejected(message))
            }
        }
    }

    pub async fn view_details(&mut self, api: &dyn ConsoleApi, batch_id: &str) {
        self.row_menu.close();
        self.loading = true;
        let outcome = api.batch_items(batch_id).await;
        self.loading = false;
        match outcome {
            Ok(items) => {
                let batch = self.batches.iter().find(|b| b.batch_id == batch_id).cloned();
                let distribution = Distribution::from_count(items.len());
                self.details = Some(BatchDetails {
                    batch_id: batch_id.to_string(),
                    batch,
                    items,
                    distribution,
                });
            }
            Err(err) => {
                warn!("Failed to fetch batch {}: {}", batch_id, err);
                self.error = Some(DETAILS_FAILED.to_string());
            }
        }
    }

    /// Requests a status transition. The displayed status only changes
    /// through the re-fetch that follows a confirmed transition.
    pub async fn update_status(
        &mut self,
        api: &dyn ConsoleApi,
        batch_id: &str,
        target: BatchStatus,
    ) -> bool {
        self.row_menu.close();
        self.loading = true;
        let outcome = api.update_batch_status(batch_id, target).await;
        self.loading = false;
        match outcome {
            Ok(()) => {
                info!("Batch {} marked as {}", batch_id, target);
                self.error = None;
                self.notice = Some(format!("Batch marked as {target} successfully!"));
                self.refresh(api).await;
                true
            }
            Err(err) => {
                warn!("Failed to mark batch {} as {}: {}", batch_id, target, err);
                self.error = Some(err.user_message(&format!(
                    "Failed to update batch status to {target}. Please try again later."
                )));
                false
            }
        }
    }

    /// First phase of a delete. Active batches cannot be deleted.
    pub fn request_delete(&mut self, batch: &Batch) -> bool {
        if !can_delete(batch.status) {
            debug!("Refusing delete of active batch {}", batch.batch_id);
            return false;
        }
        self.row_menu.close();
        self.pending_delete.request(batch.clone())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete.cancel();
    }

    pub async fn confirm_delete(&mut self, api: &dyn ConsoleApi) -> bool {
        let Some(batch) = self.pending_delete.begin_commit() else {
            return false;
        };
        match api.delete_batch(&batch.batch_id).await {
            Ok(()) => {
                info!("Deleted batch {}", batch.batch_id);
                self.pending_delete.complete();
                self.error = None;
                self.notice = Some(DELETE_DONE.to_string());
                if self
                    .details
                    .as_ref()
                    .is_some_and(|d| d.batch_id == batch.batch_id)
                {
                    self.details = None;
                }
                self.refresh(api).await;
                true
            }
            Err(err) => {
                warn!("Failed to delete batch {}: {}", batch.batch_id, err);
                self.pending_delete.fail();
                self.error = Some(err.user_message(DELETE_FAILED));
                false
            }
        }
    }

    /// Reports the empty roster instead of opening the per-agent list.
    pub fn check_agents_for_lists(&mut self) -> bool {
        if self.agents_loaded && self.agents.is_empty() {
            self.error = Some(NO_AGENTS.to_string());
            return false;
        }
        true
    }

    /// Fetches the items assigned to `agent`. Each call replaces the cached
    /// copy for that agent.
    pub async fn view_agent_items(&mut self, api: &dyn ConsoleApi, agent: &Agent) {
        self.selected_agent = Some(agent.clone());
        self.loading = true;
        let outcome = api.agent_items(&agent.id).await;
        self.loading = false;
        match outcome {
            Ok(items) => {
                debug!("Agent {} holds {} item(s)", agent.id, items.len());
                self.agent_items.insert(agent.id.clone(), items);
            }
            Err(err) => {
                warn!("Failed to fetch items for agent {}: {}", agent.id, err);
                self.error = Some(AGENT_ITEMS_FAILED.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(id: &str, status: BatchStatus) -> Batch {
        Batch {
            batch_id: id.to_string(),
            filename: Some(String::from("contacts.csv")),
            created_at: None,
            item_count: 12,
            status,
        }
    }

    #[test]
    fn upload_gate_counts_missing_agents() {
        assert_eq!(
            BatchBoard::upload_gate(4).unwrap_err().to_string(),
            "Please add 1 more agent(s) before uploading."
        );
        assert_eq!(
            BatchBoard::upload_gate(0),
            Err(UploadError::NotEnoughAgents { missing: 5 })
        );
        assert!(BatchBoard::upload_gate(5).is_ok());
        assert!(BatchBoard::upload_gate(9).is_ok());
    }

    #[test]
    fn unloaded_roster_blocks_upload_without_a_count() {
        let board = BatchBoard::new();
        assert!(!board.agents_loaded());
        assert_eq!(board.check_upload(), Err(UploadError::AgentsNotLoaded));
        assert!(!board.can_upload());
        assert!(!board.check_upload().unwrap_err().to_string().contains("more agent"));
    }

    #[test]
    fn active_batch_delete_is_refused() {
        let mut board = BatchBoard::new();
        assert!(!board.request_delete(&batch("b1", BatchStatus::Active)));
        assert!(board.pending_delete().is_idle());

        assert!(board.request_delete(&batch("b2", BatchStatus::Completed)));
        assert_eq!(
            board.pending_delete().target().map(|b| b.batch_id.as_str()),
            Some("b2")
        );
        board.cancel_delete();
        assert!(board.pending_delete().is_idle());
    }

    #[test]
    fn row_menu_keeps_one_row_open() {
        let mut menu = RowMenu::default();
        menu.toggle("b1");
        assert!(menu.is_open("b1"));
        menu.toggle("b2");
        assert!(menu.is_open("b2"));
        assert!(!menu.is_open("b1"));
        menu.toggle("b2");
        assert_eq!(menu.open_row, None);
    }

    #[test]
    fn empty_message_names_filter() {
        let mut board = BatchBoard::new();
        assert_eq!(
            board.empty_message(),
            "No list batches found. Upload a file to create a new batch."
        );
        board.filter = BatchFilter::Status(BatchStatus::Archived);
        assert_eq!(board.empty_message(), "No archived batches found.");
    }
}
