//! Project handlers.

use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde_json::Value;

use crate::adapter::NewProject;
use crate::auth::CurrentUser;

use crate::api::error::ApiResult;
use crate::api::extract::{IdPath, ValidJson};
use crate::api::state::AppState;

/// Create a project in a workspace. The key arrives already normalized.
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path(workspace_id), _): IdPath<i64>,
    ValidJson(project): ValidJson<NewProject>,
) -> ApiResult<impl IntoResponse> {
    let created = state
        .adapter
        .create_project(Some(user.id()), workspace_id, &project)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path(workspace_id), _): IdPath<i64>,
) -> ApiResult<Json<Value>> {
    let projects = state
        .adapter
        .list_projects(Some(user.id()), workspace_id)
        .await?;
    Ok(Json(projects))
}
