//! JWT claims and token kinds.

use serde::{Deserialize, Serialize};

/// Kind of token carried in the `typ` claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer token for API calls.
    #[default]
    Access,
    /// Longer-lived token only accepted by the refresh endpoint.
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Identity embedded in a token, as validated by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Adapter user id.
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (adapter user id).
    pub sub: i64,

    /// User's email.
    pub email: String,

    /// User's display name.
    pub name: String,

    /// Issued at (as Unix timestamp).
    pub iat: i64,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Token kind. Tokens without it are access tokens.
    #[serde(default)]
    pub typ: TokenKind,
}

impl Claims {
    /// The identity carried by these claims, without timing fields.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_display() {
        assert_eq!(TokenKind::Access.to_string(), "access");
        assert_eq!(TokenKind::Refresh.to_string(), "refresh");
    }

    #[test]
    fn test_claims_without_typ_are_access() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": 7,
            "email": "b@c",
            "name": "B",
            "iat": 0,
            "exp": 60
        }))
        .unwrap();
        assert_eq!(claims.typ, TokenKind::Access);
        assert_eq!(
            claims.identity(),
            Identity {
                id: 7,
                email: "b@c".to_string(),
                name: "B".to_string()
            }
        );
    }

    #[test]
    fn test_claims_reject_non_numeric_subject() {
        let result = serde_json::from_value::<Claims>(serde_json::json!({
            "sub": "abc",
            "email": "b@c",
            "name": "B",
            "iat": 0,
            "exp": 60
        }));
        assert!(result.is_err());
    }
}
