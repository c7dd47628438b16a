//! Authentication handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::COOKIE, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::adapter::{AdapterUser, Credentials, Registration};
use crate::auth::{CurrentUser, Identity, token_from_cookie_header};

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ValidJson;
use crate::api::state::AppState;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Login and registration response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(rename = "accessToken")]
    pub access_token_camel: String,
    pub access_token: String,
    pub user: AdapterUser,
}

/// Refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token_camel: String,
    pub access_token: String,
}

/// Current user info.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: String,
}

fn refresh_cookie(state: &AppState, token: &str) -> String {
    let secure_flag = if state.secure_cookies { " Secure;" } else { "" };
    format!(
        "{}={}; Path=/auth; HttpOnly; SameSite=Lax;{} Max-Age={}",
        REFRESH_COOKIE,
        token,
        secure_flag,
        state.tokens.refresh_ttl().num_seconds()
    )
}

/// Issue an access token, plus a refresh cookie, for an adapter user.
fn start_session(state: &AppState, user: AdapterUser) -> ApiResult<Response> {
    let identity = Identity {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    };
    let access_token = state.tokens.issue(&identity)?;
    let refresh_token = state.tokens.issue_refresh(&identity)?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, refresh_cookie(state, &refresh_token))]),
        Json(SessionResponse {
            access_token_camel: access_token.clone(),
            access_token,
            user,
        }),
    )
        .into_response())
}

/// Log in with credentials checked by the adapter.
#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(credentials): ValidJson<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let user = state.adapter.validate_user(&credentials).await?;
    info!("User {} logged in", user.id);
    start_session(&state, user)
}

/// Register a new user with the adapter and log them in.
#[instrument(skip(state, registration), fields(email = %registration.email))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(registration): ValidJson<Registration>,
) -> ApiResult<impl IntoResponse> {
    let user = state.adapter.register_user(&registration).await?;
    info!("Registered user {}", user.id);
    start_session(&state, user)
}

/// Exchange the refresh cookie for a new access token.
#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| token_from_cookie_header(value, REFRESH_COOKIE))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::validation("Missing refresh_token cookie"))?;

    let access_token = state.tokens.refresh(refresh_token)?;

    Ok((
        StatusCode::CREATED,
        Json(RefreshResponse {
            access_token_camel: access_token.clone(),
            access_token,
        }),
    ))
}

/// Get current user info.
pub async fn me(user: CurrentUser) -> Json<UserInfo> {
    Json(UserInfo {
        id: user.id(),
        email: user.email().to_string(),
        name: user.name().to_string(),
    })
}
