//! Audit logging for authenticated requests and identity substitutions.

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::api::AppState;
use crate::auth::CurrentUser;

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_caller_id: Option<i64>,
}

impl AuditEvent {
    fn new(event: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event: event.to_string(),
            user_id: None,
            method: None,
            path: None,
            status: None,
            duration_ms: None,
            operation: None,
            rejected_caller_id: None,
        }
    }
}

/// Append-only JSONL audit log.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl AuditLogger {
    pub async fn new(path: PathBuf) -> Result<Self> {
        ensure_parent_dir(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("opening audit log file {}", path.display()))?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn log_http(
        &self,
        user_id: i64,
        method: &str,
        path: &str,
        status: u16,
        duration_ms: u128,
    ) {
        let event = AuditEvent {
            user_id: Some(user_id),
            method: Some(method.to_string()),
            path: Some(path.to_string()),
            status: Some(status),
            duration_ms: Some(duration_ms),
            ..AuditEvent::new("http_request")
        };
        self.write_event(&event).await;
    }

    /// Record an adapter call made as the fallback user.
    pub async fn log_identity_fallback(
        &self,
        operation: &str,
        rejected_caller_id: Option<i64>,
        fallback_id: i64,
    ) {
        let event = AuditEvent {
            user_id: Some(fallback_id),
            operation: Some(operation.to_string()),
            rejected_caller_id,
            ..AuditEvent::new("identity_fallback")
        };
        self.write_event(&event).await;
    }

    async fn write_event(&self, event: &AuditEvent) {
        let mut line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize {} audit event: {}", event.event, e);
                return;
            }
        };
        line.push('\n');

        let mut file = self.file.lock().await;
        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(
                "Failed to write {} audit event to {}: {}",
                event.event,
                self.path.display(),
                e
            );
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating audit log directory {}", parent.display()))?;
    }
    Ok(())
}

/// Records every authenticated request once the response is ready.
///
/// Must run inside the auth middleware so `CurrentUser` is already set.
pub async fn audit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user_id = req.extensions().get::<CurrentUser>().map(CurrentUser::id);

    let response = next.run(req).await;

    if let (Some(logger), Some(user_id)) = (state.audit.as_ref(), user_id) {
        let status = response.status().as_u16();
        let duration_ms = start.elapsed().as_millis();
        logger
            .log_http(user_id, &method, &path, status, duration_ms)
            .await;
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn read_lines(path: &Path) -> Vec<Value> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_audit_logger_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let logger = AuditLogger::new(path.clone()).await.unwrap();
        assert_eq!(logger.path(), path.as_path());

        logger.log_http(7, "GET", "/workspaces", 200, 12).await;
        logger
            .log_identity_fallback("list workspaces", Some(-1), 9)
            .await;

        let lines = read_lines(&path).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "http_request");
        assert_eq!(lines[0]["user_id"], 7);
        assert_eq!(lines[0]["status"], 200);
        assert!(lines[0].get("operation").is_none());

        assert_eq!(lines[1]["event"], "identity_fallback");
        assert_eq!(lines[1]["user_id"], 9);
        assert_eq!(lines[1]["rejected_caller_id"], -1);
        assert_eq!(lines[1]["operation"], "list workspaces");
    }

    #[tokio::test]
    async fn test_audit_logger_reopens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        AuditLogger::new(path.clone())
            .await
            .unwrap()
            .log_http(1, "GET", "/auth/me", 200, 1)
            .await;
        AuditLogger::new(path.clone())
            .await
            .unwrap()
            .log_http(2, "GET", "/auth/me", 200, 1)
            .await;

        let lines = read_lines(&path).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["user_id"], 2);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        tokio::fs::write(&path, "").await.unwrap();

        // A read-only handle makes every write fail.
        let logger = AuditLogger {
            file: Arc::new(Mutex::new(File::open(&path).await.unwrap())),
            path: path.clone(),
        };
        logger
            .log_identity_fallback("create issue", None, 9)
            .await;
        logger.log_http(1, "GET", "/auth/me", 200, 1).await;

        assert!(read_lines(&path).await.is_empty());
    }
}
