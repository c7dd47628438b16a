//! HTTP API: routes, handlers and the error body every failure uses.

mod error;
mod extract;
pub mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use extract::{IdPath, ValidJson, Validate, normalize_project_key};
pub use routes::create_router;
pub use state::AppState;
