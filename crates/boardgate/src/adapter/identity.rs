//! Caller id resolution for identity-bearing adapter calls.

use serde::{Deserialize, Serialize};

use super::error::AdapterError;

/// A strictly positive adapter user id, sent as `x-user-id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct CallerId(i64);

impl CallerId {
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for CallerId {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("caller id must be positive, got {raw}"))
    }
}

impl From<CallerId> for i64 {
    fn from(id: CallerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of resolving a raw caller id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The request carried a usable id.
    Caller(CallerId),
    /// The request id was missing or invalid and the fallback was used.
    Fallback {
        id: CallerId,
        rejected: Option<i64>,
    },
}

impl Resolution {
    pub fn id(self) -> CallerId {
        match self {
            Resolution::Caller(id) | Resolution::Fallback { id, .. } => id,
        }
    }
}

/// How missing or invalid caller ids are handled.
///
/// Strict by default. A fallback id lets any unidentified call act as that
/// user, so it is only set from explicit operator configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityPolicy {
    fallback: Option<CallerId>,
}

impl IdentityPolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: CallerId) -> Self {
        Self {
            fallback: Some(fallback),
        }
    }

    pub fn fallback(&self) -> Option<CallerId> {
        self.fallback
    }

    /// Resolve the caller id for a call, before any network I/O.
    pub fn resolve(&self, raw: Option<i64>) -> Result<Resolution, AdapterError> {
        if let Some(id) = raw.and_then(CallerId::new) {
            return Ok(Resolution::Caller(id));
        }

        if let Some(id) = self.fallback {
            return Ok(Resolution::Fallback { id, rejected: raw });
        }

        Err(AdapterError::MissingIdentity(match raw {
            None => "Missing x-user-id (caller id is undefined)".to_string(),
            Some(_) => "Missing or invalid x-user-id header".to_string(),
        }))
    }
}
