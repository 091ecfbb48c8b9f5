//! Wire shapes of the Distributo REST API.
//!
//! Record identifiers arrive as `_id` from the backend; `id` is accepted too.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// --- Auth ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

/// Token and identity handed out by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// --- Agents ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(rename = "hasPassword", default)]
    pub has_password: bool,
}

/// Body of `POST /api/agents` and `PUT /api/agents/:id`. The password is only
/// ever sent on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPayload {
    pub name: String,
    pub email: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentList {
    pub agents: Vec<Agent>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentsResponse {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// Create/update replies either wrap the record or return it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AgentEnvelope {
    Wrapped { agent: Agent },
    Bare(Agent),
}

impl AgentEnvelope {
    pub fn into_agent(self) -> Agent {
        match self {
            AgentEnvelope::Wrapped { agent } | AgentEnvelope::Bare(agent) => agent,
        }
    }
}

// --- Batches ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Active,
    Completed,
    Archived,
    Cancelled,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 5] = [
        BatchStatus::Pending,
        BatchStatus::Active,
        BatchStatus::Completed,
        BatchStatus::Archived,
        BatchStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Active => "active",
            BatchStatus::Completed => "completed",
            BatchStatus::Archived => "archived",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "Pending",
            BatchStatus::Active => "Active",
            BatchStatus::Completed => "Completed",
            BatchStatus::Archived => "Archived",
            BatchStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub item_count: usize,
    pub status: BatchStatus,
}

/// Server-side filter for `GET /api/lists/batches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFilter {
    #[default]
    All,
    Status(BatchStatus),
}

impl BatchFilter {
    /// Filters offered by the console, in display order.
    pub const CHOICES: [BatchFilter; 4] = [
        BatchFilter::All,
        BatchFilter::Status(BatchStatus::Active),
        BatchFilter::Status(BatchStatus::Completed),
        BatchFilter::Status(BatchStatus::Archived),
    ];

    pub fn status(&self) -> Option<BatchStatus> {
        match self {
            BatchFilter::All => None,
            BatchFilter::Status(status) => Some(*status),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatchFilter::All => "All",
            BatchFilter::Status(status) => status.label(),
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::CHOICES.iter().position(|f| f == self).unwrap_or(0);
        Self::CHOICES[(idx + 1) % Self::CHOICES.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchList {
    pub batches: Vec<Batch>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchesResponse {
    #[serde(default)]
    pub batches: Vec<Batch>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusPayload {
    pub status: BatchStatus,
}

// --- List items ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

/// `agent` is populated on batch detail replies and may be a bare id
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignee {
    Agent(AgentRef),
    Id(String),
}

impl Assignee {
    pub fn id(&self) -> &str {
        match self {
            Assignee::Agent(agent) => &agent.id,
            Assignee::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Assignee::Agent(agent) => Some(&agent.name),
            Assignee::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub agent: Option<Assignee>,
}

impl ListItem {
    pub fn assignee_name(&self) -> &str {
        self.agent
            .as_ref()
            .and_then(|agent| agent.name())
            .unwrap_or("Unassigned")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchItemsResponse {
    #[serde(default)]
    pub list_items: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentItemsResponse {
    #[serde(default)]
    pub lists: Vec<ListItem>,
}

// --- Upload ---

/// One contact file, already read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ListUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => "text/csv",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("xls") => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }
}

// --- Generic replies ---

/// `{ success, message }` reply of mutating endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
