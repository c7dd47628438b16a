//! Application state shared across handlers.

use std::sync::Arc;

use crate::adapter::AdapterApi;
use crate::audit::AuditLogger;
use crate::auth::TokenService;

/// Shared application state.
///
/// Read-only after startup; cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Token issuance and verification.
    pub tokens: TokenService,
    /// Backend adapter.
    pub adapter: Arc<dyn AdapterApi>,
    /// Whether the refresh cookie carries the `Secure` flag.
    pub secure_cookies: bool,
    /// Audit logger, when an audit file is configured.
    pub audit: Option<AuditLogger>,
}

impl AppState {
    pub fn new(tokens: TokenService, adapter: Arc<dyn AdapterApi>) -> Self {
        Self {
            tokens,
            adapter,
            secure_cookies: true,
            audit: None,
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }
}
