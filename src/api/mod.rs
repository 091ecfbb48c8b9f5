//! Gateway to the Distributo REST backend.
//!
//! Every view reaches the backend through the [`ConsoleApi`] trait. The
//! production implementation is [`http::HttpApi`]; tests substitute an
//! in-memory backend.

pub mod http;
pub mod models;

use async_trait::async_trait;

use models::{
    Agent, AgentList, AgentPayload, BatchFilter, BatchList, BatchStatus, Credentials, ListItem,
    ListUpload, LoginGrant, User,
};

pub use http::HttpApi;

/// Normalised failure of a gateway call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connection, timeout, ...).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with an error status or `success: false`.
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    /// The credential was missing or rejected.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },
    /// A success status with a body we could not decode.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Message sent by the backend, verbatim.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } | ApiError::Unauthorized { message } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            ApiError::Network(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    /// What to show the operator: the backend's own message when it sent
    /// one, otherwise the operation-specific `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

#[async_trait]
pub trait ConsoleApi: Send + Sync {
    // --- auth ---
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;
    /// Resolves the owner of the current credential.
    async fn me(&self) -> Result<User, ApiError>;

    // --- agents ---
    async fn list_agents(&self) -> Result<AgentList, ApiError>;
    /// Returns the stored record when the reply carries one.
    async fn create_agent(&self, payload: &AgentPayload) -> Result<Option<Agent>, ApiError>;
    async fn update_agent(
        &self,
        id: &str,
        payload: &AgentPayload,
    ) -> Result<Option<Agent>, ApiError>;
    async fn delete_agent(&self, id: &str) -> Result<(), ApiError>;

    // --- batches ---
    async fn list_batches(&self, filter: BatchFilter) -> Result<BatchList, ApiError>;
    async fn batch_items(&self, batch_id: &str) -> Result<Vec<ListItem>, ApiError>;
    async fn upload_list(&self, upload: ListUpload) -> Result<(), ApiError>;
    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), ApiError>;
    async fn delete_batch(&self, batch_id: &str) -> Result<(), ApiError>;

    // --- per-agent lists ---
    async fn agent_items(&self, agent_id: &str) -> Result<Vec<ListItem>, ApiError>;
}
