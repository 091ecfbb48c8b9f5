//! Agent roster view: list, create, edit and delete agents.

use log::{debug, info, warn};

use crate::api::ConsoleApi;
use crate::api::models::{Agent, AgentPayload};
use crate::confirm::Confirmation;
use crate::validation::{self, ValidationErrors};

const FETCH_FAILED: &str = "Failed to fetch agents. Please try again later.";
const DELETE_FAILED: &str = "Failed to delete agent. Please try again later.";
const SAVE_FAILED: &str = "An error occurred. Please try again.";

/// Form contents for the agent editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentDraft {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
}

impl AgentDraft {
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            email: agent.email.clone(),
            mobile: agent.mobile.clone(),
            password: String::new(),
        }
    }

    /// Creation requires a password; edits never send one.
    pub fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(validation::validate_name(&self.name));
        errors.check(validation::validate_email(&self.email));
        errors.check(validation::validate_mobile(&self.mobile));
        if creating {
            errors.check(validation::validate_new_password(&self.password));
        }
        errors.into_result()
    }

    fn payload(&self, creating: bool) -> AgentPayload {
        AgentPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            password: creating.then(|| self.password.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0}")]
    Invalid(ValidationErrors),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    count: usize,
    selected: usize,
    loading: bool,
    saving: bool,
    error: Option<String>,
    notice: Option<String>,
    pending_delete: Confirmation<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.saving || self.pending_delete.is_committing()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn pending_delete(&self) -> &Confirmation<Agent> {
        &self.pending_delete
    }

    pub fn selected(&self) -> Option<&Agent> {
        self.agents.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.agents.is_empty() {
            self.selected = (self.selected + 1).min(self.agents.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub fn mark_saving(&mut self) {
        self.saving = true;
    }

    pub async fn refresh(&mut self, api: &dyn ConsoleApi) {
        self.loading = true;
        let outcome = api.list_agents().await;
        self.loading = false;
        match outcome {
            Ok(list) => {
                debug!("Fetched {} agent(s)", list.agents.len());
                self.agents = list.agents;
                self.count = list.count;
                self.error = None;
                if self.selected >= self.agents.len() {
                    self.selected = self.agents.len().saturating_sub(1);
                }
            }
            Err(err) => {
                warn!("Failed to fetch agents: {}", err);
                self.error = Some(FETCH_FAILED.to_string());
            }
        }
    }

    pub async fn create(&mut self, api: &dyn ConsoleApi, draft: &AgentDraft) -> Result<(), FormError> {
        draft.validate(true).map_err(FormError::Invalid)?;
        self.saving = true;
        let outcome = api.create_agent(&draft.payload(true)).await;
        self.saving = false;
        match outcome {
            Ok(_) => {
                info!("Created agent {}", draft.email.trim());
                self.notice = Some(String::from("Agent created successfully!"));
                self.refresh(api).await;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to create agent: {}", err);
                Err(FormError::Rejected(err.user_message(SAVE_FAILED)))
            }
        }
    }

    pub async fn update(
        &mut self,
        api: &dyn ConsoleApi,
        id: &str,
        draft: &AgentDraft,
    ) -> Result<(), FormError> {
        draft.validate(false).map_err(FormError::Invalid)?;
        self.saving = true;
        let outcome = api.update_agent(id, &draft.payload(false)).await;
        self.saving = false;
        match outcome {
            Ok(_) => {
                info!("Updated agent {}", id);
                self.notice = Some(String::from("Agent updated successfully!"));
                self.refresh(api).await;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to update agent {}: {}", id, err);
                Err(FormError::Rejected(err.user_message(SAVE_FAILED)))
            }
        }
    }

    pub fn request_delete(&mut self, agent: &Agent) -> bool {
        self.pending_delete.request(agent.clone())
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete.cancel();
    }

    pub async fn confirm_delete(&mut self, api: &dyn ConsoleApi) -> bool {
        let Some(agent) = self.pending_delete.begin_commit() else {
            return false;
        };
        match api.delete_agent(&agent.id).await {
            Ok(()) => {
                info!("Deleted agent {}", agent.id);
                self.pending_delete.complete();
                self.error = None;
                self.notice = Some(String::from("Agent deleted successfully!"));
                self.refresh(api).await;
                true
            }
            Err(err) => {
                warn!("Failed to delete agent {}: {}", agent.id, err);
                self.pending_delete.fail();
                self.error = Some(err.user_message(DELETE_FAILED));
                false
            }
        }
    }
}
