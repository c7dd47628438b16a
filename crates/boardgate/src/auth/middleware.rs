//! Authentication middleware.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use log::debug;

use super::{AuthError, Claims, TokenService};

/// Extract a Bearer token from an Authorization header value.
pub(crate) fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Find a cookie value in a `Cookie` header.
pub fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == cookie_name {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Authenticated caller extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Verified access token claims.
    pub claims: Claims,
}

impl CurrentUser {
    /// Adapter user id of the caller.
    pub fn id(&self) -> i64 {
        self.claims.sub
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    pub fn name(&self) -> &str {
        &self.claims.name
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication middleware.
///
/// Accepts only `Authorization: Bearer <access token>` and injects
/// `CurrentUser` into request extensions. Anything else is rejected before
/// the handler runs.
pub async fn auth_middleware(
    State(tokens): State<TokenService>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = bearer_token_from_header(header)?;
    let claims = tokens.verify(token)?;
    debug!("Authenticated user {} for {}", claims.sub, req.uri().path());

    req.extensions_mut().insert(CurrentUser { claims });

    Ok(next.run(req).await)
}
