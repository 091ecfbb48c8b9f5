//! Core state of the console shell.
//!
//! `App` owns one view model per screen plus the overlay stack and the queue
//! slot for the single network action that may be in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::ConsoleApi;
use crate::api::models::{Agent, Batch, BatchFilter, BatchStatus};
use crate::batches::BatchBoard;
use crate::confirm::ConfirmChoice;
use crate::dashboard::Dashboard;
use crate::guard::Route;
use crate::registry::{AgentDraft, AgentRegistry};
use crate::session::SessionManager;
use crate::validation::{Field, ValidationErrors};

use super::input::TextInput;

pub struct App {
    /// Set by Ctrl+Q; the event loop exits on the next iteration.
    pub should_quit: bool,
    /// Screen currently shown, always the result of the route guard.
    pub route: Route,
    pub session: SessionManager,
    pub(crate) api: Arc<dyn ConsoleApi>,

    pub dashboard: Dashboard,
    pub registry: AgentRegistry,
    pub batches: BatchBoard,
    pub login: AuthForm,
    pub register: AuthForm,

    pub overlay: Option<OverlayState>,
    pub status_message: String,

    /// Action queued by a key press, run after the next redraw.
    pub(crate) pending: Option<PendingAction>,
    pub(crate) status_set_at: Option<Instant>,
    pub(crate) status_ttl: Duration,
    pub(crate) tick_rate: Duration,
}

/// Network work started from the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Login { email: String, password: String },
    Register { email: String, password: String },
    RefreshDashboard,
    RefreshAgents,
    RefreshLists,
    SaveAgent { id: Option<String>, draft: AgentDraft },
    DeleteAgent,
    SetFilter(BatchFilter),
    Upload(PathBuf),
    ViewDetails(String),
    UpdateStatus { batch_id: String, status: BatchStatus },
    DeleteBatch,
    ViewAgentItems(Agent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Login and registration forms share one shape; registration adds the
/// confirmation field.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: TextInput,
    pub password: TextInput,
    pub confirm: TextInput,
    pub focus: usize,
    pub errors: ValidationErrors,
    /// Message returned by the server for the last attempt.
    pub error: Option<String>,
    pub notice: Option<String>,
    pub submitting: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            email: TextInput::new(),
            password: TextInput::masked(),
            confirm: TextInput::masked(),
            focus: 0,
            errors: ValidationErrors::default(),
            error: None,
            notice: None,
            submitting: false,
        }
    }

    pub fn field_count(&self) -> usize {
        match self.mode {
            AuthMode::Login => 2,
            AuthMode::Register => 3,
        }
    }

    pub fn fields(&self) -> Vec<(Field, &TextInput)> {
        let mut fields = vec![(Field::Email, &self.email), (Field::Password, &self.password)];
        if self.mode == AuthMode::Register {
            fields.push((Field::ConfirmPassword, &self.confirm));
        }
        fields
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            0 => &mut self.email,
            1 => &mut self.password,
            _ => &mut self.confirm,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    pub fn focus_prev(&mut self) {
        let count = self.field_count();
        self.focus = (self.focus + count - 1) % count;
    }

    /// Forgets everything typed, keeping any notice for the operator.
    pub fn reset(&mut self) {
        let notice = self.notice.take();
        *self = Self::new(self.mode);
        self.notice = notice;
    }
}

/// Create/edit form for one agent.
#[derive(Debug, Clone)]
pub struct AgentEditorState {
    /// `None` when creating.
    pub agent_id: Option<String>,
    pub name: TextInput,
    pub email: TextInput,
    pub mobile: TextInput,
    pub password: TextInput,
    pub focus: usize,
    pub errors: ValidationErrors,
    pub error: Option<String>,
}

impl AgentEditorState {
    pub fn create() -> Self {
        Self {
            agent_id: None,
            name: TextInput::new(),
            email: TextInput::new(),
            mobile: TextInput::new(),
            password: TextInput::masked(),
            focus: 0,
            errors: ValidationErrors::default(),
            error: None,
        }
    }

    pub fn edit(agent: &Agent) -> Self {
        Self {
            agent_id: Some(agent.id.clone()),
            name: TextInput::with_value(&agent.name),
            email: TextInput::with_value(&agent.email),
            mobile: TextInput::with_value(&agent.mobile),
            password: TextInput::masked(),
            focus: 0,
            errors: ValidationErrors::default(),
            error: None,
        }
    }

    pub fn is_create(&self) -> bool {
        self.agent_id.is_none()
    }

    pub fn title(&self) -> &'static str {
        if self.is_create() {
            "Add New Agent"
        } else {
            "Edit Agent"
        }
    }

    pub fn field_count(&self) -> usize {
        if self.is_create() { 4 } else { 3 }
    }

    pub fn fields(&self) -> Vec<(Field, &TextInput)> {
        let mut fields = vec![
            (Field::Name, &self.name),
            (Field::Email, &self.email),
            (Field::Mobile, &self.mobile),
        ];
        if self.is_create() {
            fields.push((Field::Password, &self.password));
        }
        fields
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            0 => &mut self.name,
            1 => &mut self.email,
            2 => &mut self.mobile,
            _ => &mut self.password,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    pub fn focus_prev(&mut self) {
        let count = self.field_count();
        self.focus = (self.focus + count - 1) % count;
    }

    pub fn draft(&self) -> AgentDraft {
        AgentDraft {
            name: self.name.value().to_string(),
            email: self.email.value().to_string(),
            mobile: self.mobile.value().to_string(),
            password: self.password.value().to_string(),
        }
    }
}

/// What a confirmation dialog is about to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteSubject {
    Agent(Agent),
    Batch(Batch),
}

#[derive(Debug, Clone)]
pub struct ConfirmDeleteState {
    pub subject: DeleteSubject,
    pub choice: ConfirmChoice,
}

impl ConfirmDeleteState {
    pub fn new(subject: DeleteSubject) -> Self {
        Self {
            subject,
            choice: ConfirmChoice::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadPromptState {
    pub path: TextInput,
    pub error: Option<String>,
}

/// Agent chooser in front of the per-agent item list.
#[derive(Debug, Clone, Default)]
pub struct AgentPickerState {
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    AgentEditor(AgentEditorState),
    ConfirmDelete(ConfirmDeleteState),
    UploadPrompt(UploadPromptState),
    BatchDetails { scroll: u16 },
    AgentPicker(AgentPickerState),
    AgentItems { scroll: u16 },
}
