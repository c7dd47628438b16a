//! Adapter HTTP client.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::audit::AuditLogger;

use super::AdapterApi;
use super::error::{AdapterOp, AdapterResult, TransportFailure, translate};
use super::identity::{CallerId, IdentityPolicy, Resolution};
use super::types::*;

/// Header carrying the caller id on identity-bearing calls.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Client for the backend adapter.
#[derive(Debug, Clone)]
pub struct AdapterClient {
    /// HTTP client.
    client: Client,
    /// Base URL without a trailing slash (e.g. "http://localhost:3001").
    base_url: String,
    identity: IdentityPolicy,
    audit: Option<AuditLogger>,
}

impl AdapterClient {
    /// Create a new adapter client.
    ///
    /// No request timeout is set beyond the transport defaults.
    pub fn new(base_url: impl Into<String>, identity: IdentityPolicy) -> reqwest::Result<Self> {
        let client = Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            identity,
            audit: None,
        })
    }

    /// Record fallback identity substitutions in the audit log.
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the caller id for an identity-bearing call.
    async fn caller(&self, op: AdapterOp, raw: Option<i64>) -> AdapterResult<CallerId> {
        let resolution = self.identity.resolve(raw).inspect_err(|_| {
            debug!("Refusing adapter {} call without a caller id", op);
        })?;

        if let Resolution::Fallback { id, rejected } = resolution {
            warn!(
                "Adapter {} call has no valid caller id ({:?}), acting as fallback user {}",
                op, rejected, id
            );
            if let Some(audit) = &self.audit {
                audit
                    .log_identity_fallback(op.label(), rejected, id.get())
                    .await;
            }
        }

        Ok(resolution.id())
    }

    fn request(&self, method: Method, path: &str, caller: Option<CallerId>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match caller {
            Some(caller) => builder.header(USER_ID_HEADER, caller.to_string()),
            None => builder,
        }
    }

    /// Send the request and translate any failure for `op`.
    async fn call<T: DeserializeOwned>(
        &self,
        op: AdapterOp,
        request: RequestBuilder,
    ) -> AdapterResult<T> {
        send(request).await.map_err(|failure| {
            warn!("Adapter {} failed: {}", op, failure);
            translate(op, failure)
        })
    }
}

/// Perform one round trip and classify the outcome.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TransportFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| TransportFailure::Network(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| TransportFailure::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(TransportFailure::Upstream {
            status: status.as_u16(),
            body: error_body(&text),
        });
    }

    let value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| TransportFailure::Decode(e.to_string()))?
    };
    serde_json::from_value(value).map_err(|e| TransportFailure::Decode(e.to_string()))
}

/// Error bodies are kept as JSON when possible, raw text otherwise.
fn error_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl AdapterApi for AdapterClient {
    async fn validate_user(&self, credentials: &Credentials) -> AdapterResult<AdapterUser> {
        let request = self
            .request(Method::POST, "/internal/auth/validate", None)
            .json(credentials);
        self.call(AdapterOp::ValidateUser, request).await
    }

    async fn register_user(&self, registration: &Registration) -> AdapterResult<AdapterUser> {
        let request = self
            .request(Method::POST, "/internal/auth/register", None)
            .json(registration);
        self.call(AdapterOp::RegisterUser, request).await
    }

    async fn create_workspace(
        &self,
        caller: Option<i64>,
        workspace: &NewWorkspace,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::CreateWorkspace;
        let caller = self.caller(op, caller).await?;
        let request = self
            .request(Method::POST, "/internal/workspaces", Some(caller))
            .json(workspace);
        self.call(op, request).await
    }

    async fn list_workspaces(&self, caller: Option<i64>) -> AdapterResult<Value> {
        let op = AdapterOp::ListWorkspaces;
        let caller = self.caller(op, caller).await?;
        let request = self.request(Method::GET, "/internal/workspaces", Some(caller));
        self.call(op, request).await
    }

    async fn create_project(
        &self,
        caller: Option<i64>,
        workspace_id: i64,
        project: &NewProject,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::CreateProject;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/workspaces/{workspace_id}/projects");
        let request = self
            .request(Method::POST, &path, Some(caller))
            .json(project);
        self.call(op, request).await
    }

    async fn list_projects(&self, caller: Option<i64>, workspace_id: i64) -> AdapterResult<Value> {
        let op = AdapterOp::ListProjects;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/workspaces/{workspace_id}/projects");
        let request = self.request(Method::GET, &path, Some(caller));
        self.call(op, request).await
    }

    async fn get_board(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value> {
        let op = AdapterOp::GetBoard;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/projects/{project_id}/board");
        let request = self.request(Method::GET, &path, Some(caller));
        self.call(op, request).await
    }

    async fn get_board_issues(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value> {
        let op = AdapterOp::GetBoardIssues;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/projects/{project_id}/board/issues");
        let request = self.request(Method::GET, &path, Some(caller));
        self.call(op, request).await
    }

    async fn create_issue(
        &self,
        caller: Option<i64>,
        project_id: i64,
        issue: &NewIssue,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::CreateIssue;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/projects/{project_id}/issues");
        let request = self.request(Method::POST, &path, Some(caller)).json(issue);
        self.call(op, request).await
    }

    async fn move_issue(
        &self,
        caller: Option<i64>,
        issue_id: i64,
        movement: &MoveIssue,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::MoveIssue;
        let caller = self.caller(op, caller).await?;
        let path = format!("/internal/issues/{issue_id}/move");
        let request = self
            .request(Method::PATCH, &path, Some(caller))
            .json(movement);
        self.call(op, request).await
    }
}
