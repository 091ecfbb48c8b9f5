use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ApiSettings;
use crate::session::SessionContext;

use super::models::{
    Ack, Agent, AgentEnvelope, AgentItemsResponse, AgentList, AgentPayload, AgentsResponse,
    AuthResponse, BatchFilter, BatchItemsResponse, BatchList, BatchStatus, BatchesResponse,
    Credentials, ErrorBody, ListItem, ListUpload, LoginGrant, StatusPayload, User,
};
use super::{ApiError, ConsoleApi};

/// `ConsoleApi` over HTTP with `reqwest`.
///
/// The credential is read from the shared [`SessionContext`] for every call,
/// so signing out takes effect on the very next request. A 401 reply
/// invalidates the context.
pub struct HttpApi {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HttpApi {
    pub fn new(settings: &ApiSettings, session: SessionContext) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.session.credential() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored credential is not a valid header value, sending none"),
            }
        }
        headers
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(ApiError::Unauthorized {
                message: body.message,
            });
        }
        Err(ApiError::Server {
            status: status.as_u16(),
            message: body.message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    /// Mutations reply `{ success, message }`; `success: false` is a failure
    /// even with a 2xx status.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_error)?;
        let ack: Ack = if text.trim().is_empty() {
            Ack::default()
        } else {
            serde_json::from_str(&text).unwrap_or_default()
        };
        if ack.success == Some(false) {
            return Err(ApiError::Server {
                status,
                message: ack.message,
            });
        }
        Ok(())
    }

    async fn agent_record(&self, request: RequestBuilder) -> Result<Option<Agent>, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await.map_err(network_error)?;
        match serde_json::from_str::<AgentEnvelope>(&text) {
            Ok(envelope) => Ok(Some(envelope.into_agent())),
            Err(err) => {
                debug!("Agent reply carried no record: {}", err);
                Ok(None)
            }
        }
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(String::from("request timed out"))
    } else {
        ApiError::Network(err.to_string())
    }
}

#[async_trait]
impl ConsoleApi for HttpApi {
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        debug!("POST /api/auth/register");
        self.acknowledge(self.client.post(self.url("/api/auth/register")).json(credentials))
            .await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        debug!("POST /api/auth/login");
        let reply: AuthResponse = self
            .fetch(self.client.post(self.url("/api/auth/login")).json(credentials))
            .await?;
        match (reply.success, reply.token, reply.user) {
            (true, Some(token), Some(user)) => Ok(LoginGrant { token, user }),
            (true, _, _) => Err(ApiError::InvalidResponse(String::from(
                "login reply is missing token or user",
            ))),
            (false, _, _) => Err(ApiError::Server {
                status: 200,
                message: reply.message,
            }),
        }
    }

    async fn me(&self) -> Result<User, ApiError> {
        debug!("GET /api/auth/me");
        if self.session.credential().is_none() {
            return Err(ApiError::Unauthorized { message: None });
        }
        let reply: AuthResponse = self.fetch(self.client.get(self.url("/api/auth/me"))).await?;
        match (reply.success, reply.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(ApiError::Unauthorized {
                message: reply.message,
            }),
        }
    }

    async fn list_agents(&self) -> Result<AgentList, ApiError> {
        debug!("GET /api/agents");
        let reply: AgentsResponse = self.fetch(self.client.get(self.url("/api/agents"))).await?;
        let count = reply.count.unwrap_or(reply.agents.len());
        Ok(AgentList {
            agents: reply.agents,
            count,
        })
    }

    async fn create_agent(&self, payload: &AgentPayload) -> Result<Option<Agent>, ApiError> {
        debug!("POST /api/agents");
        self.agent_record(self.client.post(self.url("/api/agents")).json(payload))
            .await
    }

    async fn update_agent(
        &self,
        id: &str,
        payload: &AgentPayload,
    ) -> Result<Option<Agent>, ApiError> {
        debug!("PUT /api/agents/{}", id);
        self.agent_record(
            self.client
                .put(self.url(&format!("/api/agents/{id}")))
                .json(payload),
        )
        .await
    }

    async fn delete_agent(&self, id: &str) -> Result<(), ApiError> {
        debug!("DELETE /api/agents/{}", id);
        self.acknowledge(self.client.delete(self.url(&format!("/api/agents/{id}"))))
            .await
    }

    async fn list_batches(&self, filter: BatchFilter) -> Result<BatchList, ApiError> {
        let mut request = self.client.get(self.url("/api/lists/batches"));
        if let Some(status) = filter.status() {
            request = request.query(&[("status", status.as_str())]);
        }
        debug!("GET /api/lists/batches (filter: {})", filter.label());
        let reply: BatchesResponse = self.fetch(request).await?;
        let count = reply.count.unwrap_or(reply.batches.len());
        Ok(BatchList {
            batches: reply.batches,
            count,
        })
    }

    async fn batch_items(&self, batch_id: &str) -> Result<Vec<ListItem>, ApiError> {
        debug!("GET /api/lists/batch/{}", batch_id);
        let reply: BatchItemsResponse = self
            .fetch(self.client.get(self.url(&format!("/api/lists/batch/{batch_id}"))))
            .await?;
        Ok(reply.list_items)
    }

    async fn upload_list(&self, upload: ListUpload) -> Result<(), ApiError> {
        debug!(
            "POST /api/lists/upload ({}, {} bytes)",
            upload.file_name,
            upload.content.len()
        );
        let mime = upload.mime_type();
        let part = Part::bytes(upload.content)
            .file_name(upload.file_name)
            .mime_str(mime)
            .map_err(|err| ApiError::InvalidResponse(format!("invalid upload type: {err}")))?;
        let form = Form::new().part("file", part);
        self.acknowledge(
            self.client
                .post(self.url("/api/lists/upload"))
                .multipart(form),
        )
        .await
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), ApiError> {
        debug!("PUT /api/lists/batch/{}/status -> {}", batch_id, status);
        self.acknowledge(
            self.client
                .put(self.url(&format!("/api/lists/batch/{batch_id}/status")))
                .json(&StatusPayload { status }),
        )
        .await
    }

    async fn delete_batch(&self, batch_id: &str) -> Result<(), ApiError> {
        debug!("DELETE /api/lists/batch/{}", batch_id);
        self.acknowledge(
            self.client
                .delete(self.url(&format!("/api/lists/batch/{batch_id}"))),
        )
        .await
    }

    async fn agent_items(&self, agent_id: &str) -> Result<Vec<ListItem>, ApiError> {
        debug!("GET /api/lists/agent/{}", agent_id);
        let reply: AgentItemsResponse = self
            .fetch(self.client.get(self.url(&format!("/api/lists/agent/{agent_id}"))))
            .await?;
        Ok(reply.lists)
    }
}
