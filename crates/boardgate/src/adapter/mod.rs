//! Backend adapter integration.
//!
//! The adapter owns users, workspaces, projects, boards and issues. Every
//! call is a single HTTP round trip; identity-bearing calls carry the caller
//! id in `x-user-id`.

mod client;
mod error;
mod identity;
mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{AdapterClient, USER_ID_HEADER};
pub use error::{AdapterError, AdapterOp, AdapterResult, TransportFailure, translate};
pub use identity::{CallerId, IdentityPolicy, Resolution};
pub use types::{
    AdapterUser, Credentials, MoveIssue, NewIssue, NewProject, NewWorkspace, Registration,
};

/// Operations the gateway performs against the adapter.
///
/// `caller` is the raw caller id taken from the verified token. It is
/// resolved against the identity policy before anything is sent.
#[async_trait]
pub trait AdapterApi: Send + Sync {
    async fn validate_user(&self, credentials: &Credentials) -> AdapterResult<AdapterUser>;

    async fn register_user(&self, registration: &Registration) -> AdapterResult<AdapterUser>;

    async fn create_workspace(
        &self,
        caller: Option<i64>,
        workspace: &NewWorkspace,
    ) -> AdapterResult<Value>;

    async fn list_workspaces(&self, caller: Option<i64>) -> AdapterResult<Value>;

    async fn create_project(
        &self,
        caller: Option<i64>,
        workspace_id: i64,
        project: &NewProject,
    ) -> AdapterResult<Value>;

    async fn list_projects(&self, caller: Option<i64>, workspace_id: i64) -> AdapterResult<Value>;

    async fn get_board(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value>;

    async fn get_board_issues(&self, caller: Option<i64>, project_id: i64) -> AdapterResult<Value>;

    async fn create_issue(
        &self,
        caller: Option<i64>,
        project_id: i64,
        issue: &NewIssue,
    ) -> AdapterResult<Value>;

    async fn move_issue(
        &self,
        caller: Option<i64>,
        issue_id: i64,
        movement: &MoveIssue,
    ) -> AdapterResult<Value>;
}
