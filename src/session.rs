//! Visitor session identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-visitor session identifier, carried in a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, unguessable session ID.
    pub fn generate() -> Self {
        Self(format!("sess_{}", Uuid::new_v4().simple()))
    }

    /// Accepts a cookie value only if it looks like an ID we issued.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("sess_")?;
        (rest.len() == 32 && rest.bytes().all(|b| b.is_ascii_hexdigit())).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
