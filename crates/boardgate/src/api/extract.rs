//! Request extractors that validate before any handler runs.

use axum::{
    Json,
    extract::{FromRequest, Path, Request},
};
use axum_extra::extract::WithRejection;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::adapter::{Credentials, MoveIssue, NewIssue, NewProject, NewWorkspace, Registration};

use super::error::{ApiError, ApiResult};

/// Integer path parameter(s). Parse failures become validation errors.
pub type IdPath<T> = WithRejection<Path<T>, ApiError>;

static PROJECT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9-]{2,10}$").expect("valid project key regex"));

/// Shape checks beyond what deserialization enforces.
///
/// May normalize the value on the way through.
pub trait Validate: Sized {
    fn validate(self) -> ApiResult<Self>;
}

/// JSON body that has been deserialized and validated.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value.validate()?))
    }
}

fn min_chars(field: &str, value: &str, min: usize) -> ApiResult<()> {
    if value.chars().count() < min {
        return Err(ApiError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    Ok(())
}

/// Uppercase and keep only `A-Z0-9`.
pub fn normalize_project_key(key: &str) -> String {
    key.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

impl Validate for Credentials {
    fn validate(self) -> ApiResult<Self> {
        Ok(self)
    }
}

impl Validate for Registration {
    fn validate(self) -> ApiResult<Self> {
        Ok(self)
    }
}

impl Validate for NewWorkspace {
    fn validate(self) -> ApiResult<Self> {
        Ok(self)
    }
}

impl Validate for NewProject {
    fn validate(mut self) -> ApiResult<Self> {
        min_chars("name", &self.name, 2)?;

        if !PROJECT_KEY.is_match(&self.key) {
            return Err(ApiError::validation(
                "key must match ^[A-Z0-9-]{2,10}$",
            ));
        }

        let key = normalize_project_key(&self.key);
        if key.len() < 2 {
            return Err(ApiError::validation(
                "key must contain at least 2 letters or digits",
            ));
        }
        self.key = key;

        Ok(self)
    }
}

impl Validate for NewIssue {
    fn validate(self) -> ApiResult<Self> {
        min_chars("title", &self.title, 2)?;
        Ok(self)
    }
}

impl Validate for MoveIssue {
    fn validate(self) -> ApiResult<Self> {
        Ok(self)
    }
}
