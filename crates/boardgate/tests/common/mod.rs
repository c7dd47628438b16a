//! Test utilities and common setup.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::Duration;
use serde_json::{Number, Value, json};

use boardgate::adapter::{
    AdapterApi, AdapterOp, AdapterResult, AdapterUser, CallerId, Credentials, IdentityPolicy,
    MoveIssue, NewIssue, NewProject, NewWorkspace, Registration, TransportFailure, translate,
};
use boardgate::api::{self, AppState};
use boardgate::auth::{Claims, Identity, TokenKind, TokenService};

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

pub fn test_tokens() -> TokenService {
    TokenService::new(TEST_SECRET, Duration::minutes(5), Duration::days(7))
}

#[derive(Default)]
struct Store {
    users: Vec<(AdapterUser, String)>,
    workspaces: Vec<Value>,
    projects: Vec<Value>,
    issues: Vec<Value>,
}

impl Store {
    fn next_id(items: &[Value]) -> i64 {
        items.len() as i64 + 1
    }
}

/// In-memory adapter following the same identity and error rules as the
/// HTTP client.
#[derive(Default)]
pub struct InMemoryAdapter {
    store: Mutex<Store>,
    identity: IdentityPolicy,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: i64, email: &str, name: &str, password: &str) -> Self {
        let user = AdapterUser {
            id,
            email: email.to_string(),
            name: name.to_string(),
        };
        self.store
            .lock()
            .unwrap()
            .users
            .push((user, password.to_string()));
        self
    }

    pub fn with_identity_policy(mut self, identity: IdentityPolicy) -> Self {
        self.identity = identity;
        self
    }

    /// Number of operations that reached the adapter.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every call fail as if the adapter were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn enter(&self, op: AdapterOp, caller: Option<i64>) -> AdapterResult<Option<CallerId>> {
        let caller = if op.requires_identity() {
            Some(self.identity.resolve(caller)?.id())
        } else {
            None
        };

        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(translate(
                op,
                TransportFailure::Network("connection refused".to_string()),
            ));
        }
        Ok(caller)
    }
}

fn upstream(op: AdapterOp, status: u16, message: &str) -> boardgate::adapter::AdapterError {
    translate(
        op,
        TransportFailure::Upstream {
            status,
            body: json!({ "statusCode": status, "message": message }),
        },
    )
}

fn caller_id(caller: Option<CallerId>) -> i64 {
    caller.map(CallerId::get).unwrap_or_default()
}

#[async_trait]
impl AdapterApi for InMemoryAdapter {
    async fn validate_user(&self, credentials: &Credentials) -> AdapterResult<AdapterUser> {
        let op = AdapterOp::ValidateUser;
        self.enter(op, None)?;
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|(user, password)| {
                user.email == credentials.email && *password == credentials.password
            })
            .map(|(user, _)| user.clone())
            .ok_or_else(|| upstream(op, 401, "Invalid credentials"))
    }

    async fn register_user(&self, registration: &Registration) -> AdapterResult<AdapterUser> {
        let op = AdapterOp::RegisterUser;
        self.enter(op, None)?;
        let mut store = self.store.lock().unwrap();
        if store
            .users
            .iter()
            .any(|(user, _)| user.email == registration.email)
        {
            return Err(upstream(op, 409, "Email already registered"));
        }

        let user = AdapterUser {
            id: store.users.len() as i64 + 1,
            email: registration.email.clone(),
            name: registration.name.clone(),
        };
        store
            .users
            .push((user.clone(), registration.password.clone()));
        Ok(user)
    }

    async fn create_workspace(
        &self,
        caller: Option<i64>,
        workspace: &NewWorkspace,
    ) -> AdapterResult<Value> {
        let caller = self.enter(AdapterOp::CreateWorkspace, caller)?;
        let mut store = self.store.lock().unwrap();
        let created = json!({
            "id": Store::next_id(&store.workspaces),
            "name": workspace.name,
            "ownerId": caller_id(caller),
        });
        store.workspaces.push(created.clone());
        Ok(created)
    }

    async fn list_workspaces(&self, caller: Option<i64>) -> AdapterResult<Value> {
        let caller = caller_id(self.enter(AdapterOp::ListWorkspaces, caller)?);
        let store = self.store.lock().unwrap();
        let owned: Vec<Value> = store
            .workspaces
            .iter()
            .filter(|w| w["ownerId"] == caller)
            .cloned()
            .collect();
        Ok(Value::Array(owned))
    }

    async fn create_project(
        &self,
        caller: Option<i64>,
        workspace_id: i64,
        project: &NewProject,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::CreateProject;
        self.enter(op, caller)?;
        let mut store = self.store.lock().unwrap();
        if !store.workspaces.iter().any(|w| w["id"] == workspace_id) {
            return Err(upstream(op, 404, "Workspace not found"));
        }

        let project_id = Store::next_id(&store.projects);
        let created = json!({
            "id": project_id,
            "workspaceId": workspace_id,
            "name": project.name,
            "key": project.key,
            "description": project.description,
        });
        store.projects.push(created.clone());

        // New projects start with a welcome issue in the first column.
        let issue = json!({
            "id": Store::next_id(&store.issues),
            "projectId": project_id,
            "title": "Welcome",
            "columnId": 1,
        });
        store.issues.push(issue);

        Ok(created)
    }

    async fn list_projects(&self, caller: Option<i64>, workspace_id: i64) -> AdapterResult<Value> {
        self.enter(AdapterOp::ListProjects, caller)?;
        let store = self.store.lock().unwrap();
        Ok(Value::Array(
            store
                .projects
                .iter()
                .filter(|p| p["workspaceId"] == workspace_id)
                .cloned()
                .collect(),
        ))
    }

    async fn get_board(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value> {
        let op = AdapterOp::GetBoard;
        self.enter(op, caller)?;
        let store = self.store.lock().unwrap();
        if !store.projects.iter().any(|p| p["id"] == project_id) {
            return Err(upstream(op, 404, "Project not found"));
        }
        Ok(json!({
            "projectId": project_id,
            "columns": [
                {"id": 1, "name": "To Do"},
                {"id": 2, "name": "In Progress"},
                {"id": 3, "name": "Done"},
            ],
        }))
    }

    async fn get_board_issues(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value> {
        self.enter(AdapterOp::GetBoardIssues, caller)?;
        let store = self.store.lock().unwrap();
        Ok(Value::Array(
            store
                .issues
                .iter()
                .filter(|i| i["projectId"] == project_id)
                .cloned()
                .collect(),
        ))
    }

    async fn create_issue(
        &self,
        caller: Option<i64>,
        project_id: i64,
        issue: &NewIssue,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::CreateIssue;
        self.enter(op, caller)?;
        let mut store = self.store.lock().unwrap();
        if !store.projects.iter().any(|p| p["id"] == project_id) {
            return Err(upstream(op, 404, "Project not found"));
        }

        let created = json!({
            "id": Store::next_id(&store.issues),
            "projectId": project_id,
            "title": issue.title,
            "issueType": issue.issue_type,
            "columnId": issue.column_id.clone().unwrap_or_else(|| Number::from(1_i64)),
        });
        store.issues.push(created.clone());
        Ok(created)
    }

    async fn move_issue(
        &self,
        caller: Option<i64>,
        issue_id: i64,
        movement: &MoveIssue,
    ) -> AdapterResult<Value> {
        let op = AdapterOp::MoveIssue;
        self.enter(op, caller)?;
        let mut store = self.store.lock().unwrap();
        let issue = store
            .issues
            .iter_mut()
            .find(|i| i["id"] == issue_id)
            .ok_or_else(|| upstream(op, 404, "Issue not found"))?;
        issue["columnId"] = json!(movement.to_column_id);
        Ok(issue.clone())
    }
}

/// Build the router around an adapter, with insecure cookies for tests.
pub fn test_app_with(adapter: Arc<InMemoryAdapter>) -> Router {
    let state = AppState::new(test_tokens(), adapter).with_secure_cookies(false);
    api::create_router(state, &[])
}

/// Test application with one known user: id 1, `a@b` / `secret`.
pub fn test_app() -> (Router, Arc<InMemoryAdapter>) {
    let adapter = Arc::new(InMemoryAdapter::new().with_user(1, "a@b", "A", "secret"));
    (test_app_with(adapter.clone()), adapter)
}

/// Access token signed for an arbitrary subject, bypassing `Identity` checks.
pub fn token_for_subject(sub: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub,
            email: "odd@b".to_string(),
            name: "Odd".to_string(),
            iat: now,
            exp: now + 300,
            typ: TokenKind::Access,
        },
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Access token for the known test user.
pub fn test_token() -> String {
    test_tokens()
        .issue(&Identity {
            id: 1,
            email: "a@b".to_string(),
            name: "A".to_string(),
        })
        .unwrap()
}
