//! Workspace handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::Value;

use crate::adapter::NewWorkspace;
use crate::auth::CurrentUser;

use crate::api::error::ApiResult;
use crate::api::extract::ValidJson;
use crate::api::state::AppState;

pub async fn create_workspace(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidJson(workspace): ValidJson<NewWorkspace>,
) -> ApiResult<impl IntoResponse> {
    let created = state
        .adapter
        .create_workspace(Some(user.id()), &workspace)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_workspaces(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Value>> {
    let workspaces = state.adapter.list_workspaces(Some(user.id())).await?;
    Ok(Json(workspaces))
}
