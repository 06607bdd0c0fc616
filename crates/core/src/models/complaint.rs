//! Complaint record and its enumerations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::comment::Comment;

/// Complaint status.
///
/// Transitions are unconstrained: an admin may move a complaint from any
/// status to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Submitted, not yet looked at.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Fixed.
    Resolved,
    /// Declined by an admin.
    Rejected,
}

impl Status {
    /// Every status, in tab order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Resolved,
        Self::Rejected,
    ];

    /// Lenient parse: case-insensitive, accepts `in_progress` and `inprogress`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" | "in progress" => {
                Some(Self::InProgress)
            }
            "resolved" => Some(Self::Resolved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }

    /// Badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unknown status {s:?} (expected pending, in-progress, resolved or rejected)")
        })
    }
}

/// Complaint category.
///
/// Tags outside the known set are kept verbatim (lowercased) in
/// [`Category::Other`] so filtering by them still works.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum Category {
    #[default]
    General,
    Infrastructure,
    Hostel,
    Academic,
    Mess,
    Transport,
    Other(String),
}

impl Category {
    /// Known categories, in menu order.
    pub const KNOWN: [Self; 6] = [
        Self::General,
        Self::Infrastructure,
        Self::Hostel,
        Self::Academic,
        Self::Mess,
        Self::Transport,
    ];

    /// Parse a tag; blank tags become [`Category::General`].
    #[must_use]
    pub fn from_tag(raw: &str) -> Self {
        let tag = raw.trim().to_lowercase();
        match tag.as_str() {
            "" | "general" => Self::General,
            "infrastructure" => Self::Infrastructure,
            "hostel" => Self::Hostel,
            "academic" => Self::Academic,
            "mess" => Self::Mess,
            "transport" => Self::Transport,
            _ => Self::Other(tag),
        }
    }

    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::General => "general",
            Self::Infrastructure => "infrastructure",
            Self::Hostel => "hostel",
            Self::Academic => "academic",
            Self::Mess => "mess",
            Self::Transport => "transport",
            Self::Other(tag) => tag,
        }
    }

    /// Display label: the tag with its first letter capitalized.
    #[must_use]
    pub fn label(&self) -> String {
        let tag = self.as_str();
        let mut chars = tag.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&raw))
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    /// The backend could not classify the complaint.
    Unknown,
}

impl Priority {
    /// Case-insensitive parse; anything unrecognised is [`Priority::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a complaint's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Who made the change.
    pub by: String,
    /// When the change was made.
    pub date: Option<DateTime<Utc>>,
    /// Status after the change.
    pub status: Status,
    /// Optional note attached to the change.
    pub description: Option<String>,
}

/// A student-submitted complaint ("campus resolve").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    /// Document id.
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Full text.
    pub description: String,
    /// Classification tag.
    pub category: Category,
    /// Current status.
    pub status: Status,
    /// Urgency.
    pub priority: Priority,
    /// When the complaint was submitted.
    pub created_at: Option<DateTime<Utc>>,
    /// When the complaint last changed.
    pub updated_at: Option<DateTime<Utc>>,
    /// Submitting student's identifier.
    pub student_id: Option<String>,
    /// Submitting student's name.
    pub student_name: Option<String>,
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
    /// Status history, oldest first.
    pub updates: Vec<StatusUpdate>,
}

impl Complaint {
    /// A pending complaint with no timestamps, comments or history.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category: Category::default(),
            status: Status::default(),
            priority: Priority::default(),
            created_at: None,
            updated_at: None,
            student_id: None,
            student_name: None,
            comments: Vec::new(),
            updates: Vec::new(),
        }
    }
}
