//! In-memory backend used by the integration tests.
//!
//! It mirrors the REST contract closely enough to drive the views: bearer
//! tokens are checked against the shared session context, uploads are split
//! round-robin over the first five agents, and status transitions follow the
//! server rules.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use distributo_console::api::models::{
    Agent, AgentList, AgentPayload, AgentRef, Assignee, Batch, BatchFilter, BatchList,
    BatchStatus, Credentials, ListItem, ListUpload, LoginGrant, User,
};
use distributo_console::api::{ApiError, ConsoleApi};
use distributo_console::session::{MemoryCredentialStore, SessionContext, SessionManager};

pub const PASSWORD: &str = "secret1";
pub const EMAIL: &str = "ops@distributo.io";

#[derive(Default)]
struct FakeState {
    users: HashMap<String, (String, User)>,
    tokens: HashMap<String, User>,
    agents: Vec<Agent>,
    batches: Vec<Batch>,
    items: Vec<ListItem>,
    next_id: u64,
    failures: HashMap<&'static str, ApiError>,
    calls: Vec<String>,
}

impl FakeState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

pub struct FakeApi {
    state: Mutex<FakeState>,
    session: Mutex<SessionContext>,
}

impl FakeApi {
    pub fn new(session: SessionContext) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            session: Mutex::new(session),
        }
    }

    /// Points the backend at another client session, as a second process
    /// sharing the same server would.
    pub fn attach(&self, session: SessionContext) {
        *self.session.lock().unwrap() = session;
    }

    fn session(&self) -> SessionContext {
        self.session.lock().unwrap().clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, email: &str, password: &str) -> User {
        let mut state = self.state();
        let user = User {
            id: state.id("user"),
            email: email.to_string(),
        };
        state
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Issues a token for `email` without going through login.
    pub fn issue_token(&self, email: &str) -> String {
        let mut state = self.state();
        let user = state.users.get(email).map(|(_, u)| u.clone()).unwrap();
        let token = format!("token-{}", state.next_id + 1);
        state.next_id += 1;
        state.tokens.insert(token.clone(), user);
        token
    }

    pub fn revoke_all_tokens(&self) {
        self.state().tokens.clear();
    }

    pub fn seed_agents(&self, count: usize) -> Vec<Agent> {
        let mut state = self.state();
        let start = state.agents.len();
        for n in start..start + count {
            let id = state.id("agent");
            state.agents.push(Agent {
                id,
                name: format!("Agent {}", n + 1),
                email: format!("agent{}@distributo.io", n + 1),
                mobile: format!("+9198765432{:02}", n + 1),
                has_password: true,
            });
        }
        state.agents.clone()
    }

    pub fn seed_batch(&self, filename: &str, item_count: usize, status: BatchStatus) -> Batch {
        let mut state = self.state();
        let batch_id = state.id("batch");
        let batch = Batch {
            batch_id,
            filename: Some(filename.to_string()),
            created_at: Some(String::from("2024-05-01T10:00:00Z")),
            item_count,
            status,
        };
        state.batches.push(batch.clone());
        batch
    }

    pub fn batch(&self, batch_id: &str) -> Option<Batch> {
        self.state()
            .batches
            .iter()
            .find(|b| b.batch_id == batch_id)
            .cloned()
    }

    pub fn agent_count(&self) -> usize {
        self.state().agents.len()
    }

    /// Makes the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.state().failures.insert(op, err);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn begin(&self, op: &'static str, call: String) -> Result<(), ApiError> {
        let mut state = self.state();
        state.calls.push(call);
        if let Some(err) = state.failures.remove(op) {
            if err.is_unauthorized() {
                drop(state);
                self.session().invalidate();
            }
            return Err(err);
        }
        Ok(())
    }

    fn authorize(&self) -> Result<User, ApiError> {
        let token = self.session().credential();
        let user = token.and_then(|t| self.state().tokens.get(&t).cloned());
        match user {
            Some(user) => Ok(user),
            None => {
                self.session().invalidate();
                Err(ApiError::Unauthorized {
                    message: Some(String::from("Not authorized, token failed")),
                })
            }
        }
    }

    fn rejected(message: &str) -> ApiError {
        ApiError::Server {
            status: 400,
            message: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ConsoleApi for FakeApi {
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.begin("register", String::from("POST /api/auth/register"))?;
        if self.state().users.contains_key(&credentials.email) {
            return Err(Self::rejected("User already exists"));
        }
        self.add_user(&credentials.email, &credentials.password);
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        self.begin("login", String::from("POST /api/auth/login"))?;
        let user = {
            let state = self.state();
            match state.users.get(&credentials.email) {
                Some((password, user)) if *password == credentials.password => Some(user.clone()),
                _ => None,
            }
        };
        match user {
            Some(user) => {
                let token = self.issue_token(&user.email);
                Ok(LoginGrant { token, user })
            }
            None => {
                self.session().invalidate();
                Err(ApiError::Unauthorized {
                    message: Some(String::from("Invalid credentials")),
                })
            }
        }
    }

    async fn me(&self) -> Result<User, ApiError> {
        self.begin("me", String::from("GET /api/auth/me"))?;
        self.authorize()
    }

    async fn list_agents(&self) -> Result<AgentList, ApiError> {
        self.begin("list_agents", String::from("GET /api/agents"))?;
        self.authorize()?;
        let agents = self.state().agents.clone();
        let count = agents.len();
        Ok(AgentList { agents, count })
    }

    async fn create_agent(&self, payload: &AgentPayload) -> Result<Option<Agent>, ApiError> {
        self.begin("create_agent", String::from("POST /api/agents"))?;
        self.authorize()?;
        let mut state = self.state();
        if state.agents.iter().any(|a| a.email == payload.email) {
            return Err(Self::rejected("Agent with this email already exists"));
        }
        let agent = Agent {
            id: state.id("agent"),
            name: payload.name.clone(),
            email: payload.email.clone(),
            mobile: payload.mobile.clone(),
            has_password: payload.password.is_some(),
        };
        state.agents.push(agent.clone());
        Ok(Some(agent))
    }

    async fn update_agent(
        &self,
        id: &str,
        payload: &AgentPayload,
    ) -> Result<Option<Agent>, ApiError> {
        self.begin("update_agent", format!("PUT /api/agents/{id}"))?;
        self.authorize()?;
        let mut state = self.state();
        let Some(agent) = state.agents.iter_mut().find(|a| a.id == id) else {
            return Err(ApiError::Server {
                status: 404,
                message: Some(String::from("Agent not found")),
            });
        };
        agent.name = payload.name.clone();
        agent.email = payload.email.clone();
        agent.mobile = payload.mobile.clone();
        Ok(Some(agent.clone()))
    }

    async fn delete_agent(&self, id: &str) -> Result<(), ApiError> {
        self.begin("delete_agent", format!("DELETE /api/agents/{id}"))?;
        self.authorize()?;
        let mut state = self.state();
        let before = state.agents.len();
        state.agents.retain(|a| a.id != id);
        if state.agents.len() == before {
            return Err(ApiError::Server {
                status: 404,
                message: Some(String::from("Agent not found")),
            });
        }
        Ok(())
    }

    async fn list_batches(&self, filter: BatchFilter) -> Result<BatchList, ApiError> {
        let call = match filter.status() {
            Some(status) => format!("GET /api/lists/batches?status={status}"),
            None => String::from("GET /api/lists/batches"),
        };
        self.begin("list_batches", call)?;
        self.authorize()?;
        let batches: Vec<Batch> = self
            .state()
            .batches
            .iter()
            .filter(|b| filter.status().is_none_or(|s| b.status == s))
            .cloned()
            .collect();
        let count = batches.len();
        Ok(BatchList { batches, count })
    }

    async fn batch_items(&self, batch_id: &str) -> Result<Vec<ListItem>, ApiError> {
        self.begin("batch_items", format!("GET /api/lists/batch/{batch_id}"))?;
        self.authorize()?;
        Ok(self
            .state()
            .items
            .iter()
            .filter(|item| item.batch_id.as_deref() == Some(batch_id))
            .cloned()
            .collect())
    }

    async fn upload_list(&self, upload: ListUpload) -> Result<(), ApiError> {
        self.begin("upload_list", format!("POST /api/lists/upload {}", upload.file_name))?;
        self.authorize()?;
        let text = String::from_utf8_lossy(&upload.content).into_owned();
        let rows: Vec<Vec<String>> = text
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(',').map(|c| c.trim().to_string()).collect())
            .collect();

        let mut state = self.state();
        if state.agents.len() < 5 {
            return Err(Self::rejected("At least 5 agents are required"));
        }
        let agents: Vec<Agent> = state.agents.iter().take(5).cloned().collect();
        let batch_id = state.id("batch");
        for (idx, row) in rows.iter().enumerate() {
            let agent = &agents[idx % agents.len()];
            let id = state.id("item");
            state.items.push(ListItem {
                id,
                first_name: row.first().cloned().unwrap_or_default(),
                phone: row.get(1).cloned().unwrap_or_default(),
                notes: row.get(2).cloned(),
                batch_id: Some(batch_id.clone()),
                agent: Some(Assignee::Agent(AgentRef {
                    id: agent.id.clone(),
                    name: agent.name.clone(),
                })),
            });
        }
        state.batches.push(Batch {
            batch_id,
            filename: Some(upload.file_name),
            created_at: Some(String::from("2024-05-02T09:30:00Z")),
            item_count: rows.len(),
            status: BatchStatus::Active,
        });
        Ok(())
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), ApiError> {
        self.begin(
            "update_batch_status",
            format!("PUT /api/lists/batch/{batch_id}/status {status}"),
        )?;
        self.authorize()?;
        let mut state = self.state();
        let Some(batch) = state.batches.iter_mut().find(|b| b.batch_id == batch_id) else {
            return Err(ApiError::Server {
                status: 404,
                message: Some(String::from("Batch not found")),
            });
        };
        let allowed = matches!(
            (batch.status, status),
            (BatchStatus::Active, BatchStatus::Completed)
                | (BatchStatus::Active, BatchStatus::Archived)
                | (BatchStatus::Completed, BatchStatus::Archived)
        );
        if !allowed {
            return Err(Self::rejected("Invalid status transition"));
        }
        batch.status = status;
        Ok(())
    }

    async fn delete_batch(&self, batch_id: &str) -> Result<(), ApiError> {
        self.begin("delete_batch", format!("DELETE /api/lists/batch/{batch_id}"))?;
        self.authorize()?;
        let mut state = self.state();
        let Some(batch) = state.batches.iter().find(|b| b.batch_id == batch_id) else {
            return Err(ApiError::Server {
                status: 404,
                message: Some(String::from("Batch not found")),
            });
        };
        if batch.status == BatchStatus::Active {
            return Err(Self::rejected("Cannot delete an active batch"));
        }
        state.batches.retain(|b| b.batch_id != batch_id);
        state
            .items
            .retain(|item| item.batch_id.as_deref() != Some(batch_id));
        Ok(())
    }

    async fn agent_items(&self, agent_id: &str) -> Result<Vec<ListItem>, ApiError> {
        self.begin("agent_items", format!("GET /api/lists/agent/{agent_id}"))?;
        self.authorize()?;
        Ok(self
            .state()
            .items
            .iter()
            .filter(|item| item.agent.as_ref().map(|a| a.id()) == Some(agent_id))
            .cloned()
            .collect())
    }
}

/// A fake backend with one registered operator, plus a session manager
/// talking to it.
pub struct Harness {
    pub context: SessionContext,
    pub api: Arc<FakeApi>,
    pub session: SessionManager,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_context(SessionContext::new(Arc::new(MemoryCredentialStore::new())))
    }

    pub fn with_context(context: SessionContext) -> Self {
        let api = Arc::new(FakeApi::new(context.clone()));
        api.add_user(EMAIL, PASSWORD);
        let session = SessionManager::new(context.clone(), api.clone());
        Self {
            context,
            api,
            session,
        }
    }

    /// Signs in as the seeded operator.
    pub async fn signed_in() -> Self {
        let harness = Self::new();
        harness.session.login(EMAIL, PASSWORD).await.unwrap();
        harness
    }

    pub fn csv(rows: usize) -> String {
        let mut content = String::from("firstName,phone,notes\n");
        for n in 0..rows {
            content.push_str(&format!("Contact {n},98765{n:05},note {n}\n"));
        }
        content
    }
}
