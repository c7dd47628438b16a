//! Board and issue handlers.

use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde_json::Value;

use crate::adapter::{MoveIssue, NewIssue};
use crate::auth::CurrentUser;

use crate::api::error::ApiResult;
use crate::api::extract::{IdPath, ValidJson};
use crate::api::state::AppState;

pub async fn get_board(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path(project_id), _): IdPath<i64>,
) -> ApiResult<Json<Value>> {
    let board = state.adapter.get_board(Some(user.id()), project_id).await?;
    Ok(Json(board))
}

pub async fn get_board_issues(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path(project_id), _): IdPath<i64>,
) -> ApiResult<Json<Value>> {
    let issues = state
        .adapter
        .get_board_issues(Some(user.id()), project_id)
        .await?;
    Ok(Json(issues))
}

pub async fn create_issue(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path(project_id), _): IdPath<i64>,
    ValidJson(issue): ValidJson<NewIssue>,
) -> ApiResult<impl IntoResponse> {
    let created = state
        .adapter
        .create_issue(Some(user.id()), project_id, &issue)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Move an issue. The adapter resolves the issue by id alone, so the project
/// segment is matched but not parsed.
pub async fn move_issue(
    State(state): State<AppState>,
    user: CurrentUser,
    WithRejection(Path((_project, issue_id)), _): IdPath<(String, i64)>,
    ValidJson(movement): ValidJson<MoveIssue>,
) -> ApiResult<Json<Value>> {
    let moved = state
        .adapter
        .move_issue(Some(user.id()), issue_id, &movement)
        .await?;
    Ok(Json(moved))
}
