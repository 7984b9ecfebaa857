//! Account classification.
//!
//! Whether an account is an admin is never stored on the record itself; it
//! follows from which collection the record lives in.

use serde::{Deserialize, Serialize};

/// Fixed partition key shared by every account record.
pub const PARTITION_KEY: &str = "auth";

/// The collection an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Stored in the admin accounts collection.
    Admin,
    /// Stored in the regular user accounts collection.
    User,
}

impl AccountKind {
    /// Returns `true` for [`AccountKind::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Lowercase name used in logs and health output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "users",
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        assert!(AccountKind::Admin.is_admin());
        assert!(!AccountKind::User.is_admin());
    }

    #[test]
    fn test_display_matches_health_keys() {
        assert_eq!(AccountKind::Admin.to_string(), "admin");
        assert_eq!(AccountKind::User.to_string(), "users");
    }
}
