//! Authentication module.
//!
//! Issues and verifies HS256 session tokens and guards protected routes with
//! a bearer-token middleware.

mod claims;
mod config;
mod error;
mod middleware;
mod token;

pub use claims::{Claims, Identity, TokenKind};
pub use config::{AuthConfig, ConfigValidationError, parse_duration};
pub use error::AuthError;
pub use middleware::{CurrentUser, auth_middleware, token_from_cookie_header};
pub use token::TokenService;
