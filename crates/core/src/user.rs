//! User identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, fixed-length user identifier (lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an already-generated identifier.
    ///
    /// Only ASCII alphanumerics are accepted so an id is always safe to use
    /// as a directory name.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(crate::Error::Validation(format!(
                "Invalid user id '{raw}': expected a non-empty alphanumeric string"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A registered user. Created once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Human-supplied label; not unique.
    pub identifier: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, identifier: impl Into<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_hex() {
        let id = UserId::parse("0a1b2c3d4e5f6789").unwrap();
        assert_eq!(id.as_str(), "0a1b2c3d4e5f6789");
        assert_eq!(id.to_string(), "0a1b2c3d4e5f6789");
    }

    #[test]
    fn parse_rejects_path_like_ids() {
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("../etc").is_err());
        assert!(UserId::parse("a/b").is_err());
    }

    #[test]
    fn user_serializes_id_as_plain_string() {
        let user = User::new(UserId::parse("abc123").unwrap(), "jane@example.com");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["identifier"], "jane@example.com");
    }
}
