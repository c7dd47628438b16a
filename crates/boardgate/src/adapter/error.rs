//! Adapter error types and the single translation boundary.
//!
//! The client only ever produces a [`TransportFailure`]. [`translate`] turns
//! it into the public [`AdapterError`] for the operation that failed, so the
//! HTTP mapping lives in one place instead of in every call site.

use serde_json::Value;
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Adapter operations, used to pick the translation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterOp {
    ValidateUser,
    RegisterUser,
    CreateWorkspace,
    ListWorkspaces,
    CreateProject,
    ListProjects,
    GetBoard,
    GetBoardIssues,
    CreateIssue,
    MoveIssue,
}

impl AdapterOp {
    pub fn label(self) -> &'static str {
        match self {
            AdapterOp::ValidateUser => "validate user",
            AdapterOp::RegisterUser => "register",
            AdapterOp::CreateWorkspace => "create workspace",
            AdapterOp::ListWorkspaces => "list workspaces",
            AdapterOp::CreateProject => "create project",
            AdapterOp::ListProjects => "list projects",
            AdapterOp::GetBoard => "get board",
            AdapterOp::GetBoardIssues => "get board issues",
            AdapterOp::CreateIssue => "create issue",
            AdapterOp::MoveIssue => "move issue",
        }
    }

    /// Whether the call must carry `x-user-id`.
    pub fn requires_identity(self) -> bool {
        !matches!(self, AdapterOp::ValidateUser | AdapterOp::RegisterUser)
    }
}

impl std::fmt::Display for AdapterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw outcome of a failed adapter round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// No response: connection refused, reset, DNS, ...
    Network(String),
    /// The adapter answered with a non-2xx status.
    Upstream { status: u16, body: Value },
    /// A 2xx response whose body did not have the expected shape.
    Decode(String),
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportFailure::Network(message) => write!(f, "network error: {message}"),
            TransportFailure::Upstream { status, .. } => {
                write!(f, "adapter responded with status {status}")
            }
            TransportFailure::Decode(message) => write!(f, "invalid adapter response: {message}"),
        }
    }
}

/// Errors surfaced by adapter operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// The call needs a caller id and none was usable. No request was sent.
    #[error("{0}")]
    MissingIdentity(String),

    /// The adapter refused the credentials, or could not check them.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The adapter reported a conflict, e.g. a duplicate email.
    #[error("{0}")]
    Conflict(String),

    /// The adapter failed or could not be reached.
    #[error("{message}")]
    Gateway {
        message: String,
        status: Option<u16>,
        body: Option<Value>,
    },
}

/// Translate a transport failure for the given operation.
///
/// Login failures never reveal why they failed. Registration conflicts keep
/// the adapter's message. Everything else is a bad gateway carrying the
/// upstream status and body when there was one.
pub fn translate(op: AdapterOp, failure: TransportFailure) -> AdapterError {
    match (op, failure) {
        (AdapterOp::ValidateUser, _) => AdapterError::InvalidCredentials,
        (AdapterOp::RegisterUser, TransportFailure::Upstream { status: 409, body }) => {
            let message = upstream_message(&body).unwrap_or("Registration failed");
            AdapterError::Conflict(message.to_string())
        }
        (op, TransportFailure::Upstream { status, body }) => AdapterError::Gateway {
            message: format!("Adapter {op} error"),
            status: Some(status),
            body: Some(body),
        },
        (op, TransportFailure::Network(_)) => AdapterError::Gateway {
            message: format!("Adapter {op} unreachable"),
            status: None,
            body: None,
        },
        (op, TransportFailure::Decode(_)) => AdapterError::Gateway {
            message: format!("Adapter {op} returned an invalid response"),
            status: None,
            body: None,
        },
    }
}

/// `message` of an adapter error body, if it is a non-empty string.
fn upstream_message(body: &Value) -> Option<&str> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
}
