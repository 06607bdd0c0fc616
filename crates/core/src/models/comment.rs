//! Comment record and author role.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May change status and comment on any complaint.
    Admin,
    /// May submit and track their own complaints.
    #[default]
    Student,
}

impl Role {
    /// Anything other than `admin` (case-insensitive) is a student.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Student
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }

    /// Whether this role may run admin actions.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comment attached to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Server-assigned id; `None` until the server echoes one.
    pub id: Option<String>,
    /// Author identifier.
    pub user_id: String,
    /// Author display name.
    pub user_name: String,
    /// Author role.
    pub user_role: Role,
    /// Comment text.
    pub content: String,
    /// When the comment was written.
    pub created_at: Option<DateTime<Utc>>,
    /// Complaint the comment belongs to.
    pub complaint_id: Option<String>,
}
