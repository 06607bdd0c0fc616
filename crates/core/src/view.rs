//! Text rendering of the complaint list.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::list::ComplaintList;
use crate::models::{Complaint, Status};

/// Headline shown when the view is empty.
pub const EMPTY_TITLE: &str = "No complaints found";
/// Hint shown under [`EMPTY_TITLE`].
pub const EMPTY_HINT: &str = "Try changing your filters or search query";

/// An action offered on an admin row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAction {
    /// Move the complaint to a status.
    SetStatus(Status),
    /// Open the comment box.
    Comment,
}

impl RowAction {
    /// Status actions in menu order.
    pub const STATUS_MENU: [Self; 4] = [
        Self::SetStatus(Status::Resolved),
        Self::SetStatus(Status::InProgress),
        Self::SetStatus(Status::Pending),
        Self::SetStatus(Status::Rejected),
    ];

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SetStatus(Status::Resolved) => "Mark as Resolved",
            Self::SetStatus(Status::InProgress) => "Mark as In Progress",
            Self::SetStatus(Status::Pending) => "Mark as Pending",
            Self::SetStatus(Status::Rejected) => "Reject",
            Self::Comment => "Add Comment",
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    pub category_label: String,
    /// Creation time, `None` when the complaint is undated.
    pub created_label: Option<String>,
    pub status_label: &'static str,
    pub priority_label: &'static str,
    pub comment_count: usize,
    /// Empty outside admin mode.
    pub actions: Vec<RowAction>,
}

impl ListRow {
    /// Build the row for `complaint`.
    #[must_use]
    pub fn from_complaint(complaint: &Complaint, admin: bool) -> Self {
        let actions = if admin {
            RowAction::STATUS_MENU
                .into_iter()
                .chain(std::iter::once(RowAction::Comment))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            id: complaint.id.clone(),
            title: complaint.title.clone(),
            category_label: complaint.category.label(),
            created_label: complaint.created_at.map(format_timestamp),
            status_label: complaint.status.label(),
            priority_label: complaint.priority.label(),
            comment_count: complaint.comments.len(),
            actions,
        }
    }

    /// Render as one line of text.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "[{}] {}  ({} | {} priority",
            self.status_label, self.title, self.category_label, self.priority_label
        );
        if let Some(created) = &self.created_label {
            line.push_str(" | ");
            line.push_str(created);
        }
        line.push_str(&format!(") {} comment(s)  #{}", self.comment_count, self.id));
        line
    }
}

/// Rows for the current view of `list`.
#[must_use]
pub fn rows(list: &ComplaintList, admin: bool) -> Vec<ListRow> {
    list.visible()
        .into_iter()
        .map(|c| ListRow::from_complaint(c, admin))
        .collect()
}

/// Render the current view as text lines, or the empty-state block.
#[must_use]
pub fn render(list: &ComplaintList, admin: bool) -> Vec<String> {
    if list.is_empty() {
        return vec![EMPTY_TITLE.to_string(), EMPTY_HINT.to_string()];
    }
    rows(list, admin).iter().map(ListRow::to_line).collect()
}

/// Format like `October 19th, 2026 3:04 PM` (UTC).
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{} {}{}, {}",
        at.format("%B"),
        at.day(),
        ordinal_suffix(at.day()),
        at.format("%Y %-I:%M %p")
    )
}

const fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
