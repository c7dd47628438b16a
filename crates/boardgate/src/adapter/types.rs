//! Request and response shapes exchanged with the adapter.
//!
//! Request payloads double as the public request bodies, so unknown fields
//! are rejected at deserialization time. Workspaces, projects, boards and
//! issues coming back from the adapter are relayed as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// User as returned by the adapter's auth endpoints.
///
/// Any other field the adapter sends (e.g. a password hash) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Login credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewWorkspace {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// New issue on a project board.
///
/// Numeric ids keep their original JSON representation when forwarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewIssue {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<Number>,
}

/// Move an issue to a column, optionally between two neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct MoveIssue {
    pub to_column_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_issue_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_issue_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_adapter_user_drops_extra_fields() {
        let user: AdapterUser = serde_json::from_value(json!({
            "id": 1,
            "email": "a@b",
            "name": "A",
            "password": "$2b$hash"
        }))
        .unwrap();
        let echoed = serde_json::to_value(&user).unwrap();
        assert_eq!(echoed, json!({"id": 1, "email": "a@b", "name": "A"}));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            email: "a@b".to_string(),
            password: "hunter22".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("hunter22"));
        assert!(rendered.contains("a@b"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(
            serde_json::from_value::<NewWorkspace>(json!({"name": "W", "owner": 3})).is_err()
        );
        assert!(serde_json::from_value::<MoveIssue>(json!({"columnId": 3})).is_err());
    }

    #[test]
    fn test_new_issue_keeps_camel_case_and_numbers() {
        let issue: NewIssue = serde_json::from_value(json!({
            "title": "Fix login",
            "issueType": "bug",
            "assigneeId": 4,
            "columnId": 2.5
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            json!({"title": "Fix login", "issueType": "bug", "assigneeId": 4, "columnId": 2.5})
        );
    }

    #[test]
    fn test_move_issue_requires_integers() {
        assert!(serde_json::from_value::<MoveIssue>(json!({"toColumnId": 2.5})).is_err());
        assert!(serde_json::from_value::<MoveIssue>(json!({"toColumnId": "2"})).is_err());

        let movement: MoveIssue =
            serde_json::from_value(json!({"toColumnId": 2, "afterIssueId": 9})).unwrap();
        assert_eq!(
            serde_json::to_value(&movement).unwrap(),
            json!({"toColumnId": 2, "afterIssueId": 9})
        );
    }
}
