//! Admin mutations: change status, add comment.
//!
//! Each action writes through a [`ComplaintGateway`] first and patches the
//! local [`ComplaintList`] only once the write is confirmed. Failures leave
//! the list untouched and surface as error notices.

use std::sync::Arc;

use async_trait::async_trait;
use campus_common::{AppError, AppResult};
use campus_store::ComplaintRepository;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::list::ComplaintList;
use crate::models::{Comment, Role, Status};
use crate::normalize::normalize_comment;
use crate::notify::{NoticeLevel, Notifier};

/// Shown for a blank comment.
pub const EMPTY_COMMENT: &str = "Comment cannot be empty";
/// Fallback when a failed status change carries no server message.
pub const STATUS_FAILED: &str = "Failed to update status";
/// Fallback when a failed comment carries no server message.
pub const COMMENT_FAILED: &str = "Failed to add comment";
/// Shown after a comment is stored.
pub const COMMENT_ADDED: &str = "Comment added successfully";

/// Body of a status change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    /// New status.
    pub status: Status,
    /// Acting admin's identifier.
    pub updated_by: String,
    /// RFC 3339 time of the change.
    pub update_date: String,
}

/// Body of an add-comment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct NewComment {
    pub user_id: String,
    pub user_name: String,
    pub user_role: Role,
    pub content: String,
    /// RFC 3339 time the comment was written.
    pub created_at: String,
    pub complaint_id: String,
}

/// Remote write side of the complaint store.
#[async_trait]
pub trait ComplaintGateway: Send + Sync {
    /// Persist a status change.
    async fn update_status(&self, id: &str, change: &StatusChange) -> AppResult<()>;

    /// Persist a comment. Returns the saved comment when the backend echoes
    /// one as JSON.
    async fn add_comment(&self, id: &str, comment: &NewComment) -> AppResult<Option<Value>>;
}

/// Gateway writing straight to the document store.
#[derive(Clone)]
pub struct StoreGateway {
    repo: ComplaintRepository,
}

impl StoreGateway {
    /// Create a gateway over `repo`.
    #[must_use]
    pub const fn new(repo: ComplaintRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ComplaintGateway for StoreGateway {
    async fn update_status(&self, id: &str, change: &StatusChange) -> AppResult<()> {
        self.repo
            .update_status(
                id,
                change.status.as_str(),
                &change.updated_by,
                &change.update_date,
            )
            .await
    }

    async fn add_comment(&self, id: &str, comment: &NewComment) -> AppResult<Option<Value>> {
        let stored = serde_json::to_value(comment)?;
        self.repo.append_comment(id, stored.clone()).await?;
        Ok(Some(stored))
    }
}

/// The signed-in user performing actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User identifier.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Role.
    pub role: Role,
}

impl Actor {
    /// An admin actor.
    #[must_use]
    pub fn admin(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            role: Role::Admin,
        }
    }
}

/// Runs admin actions against a gateway and reports through a notifier.
#[derive(Clone)]
pub struct AdminActions {
    gateway: Arc<dyn ComplaintGateway>,
    notifier: Arc<dyn Notifier>,
    actor: Actor,
}

impl AdminActions {
    /// Create an action runner for `actor`.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ComplaintGateway>,
        notifier: Arc<dyn Notifier>,
        actor: Actor,
    ) -> Self {
        Self {
            gateway,
            notifier,
            actor,
        }
    }

    /// The acting user.
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Change the status of complaint `id`.
    pub async fn change_status(
        &self,
        list: &mut ComplaintList,
        id: &str,
        status: Status,
    ) -> AppResult<()> {
        self.ensure_admin()?;

        let now = Utc::now();
        let change = StatusChange {
            status,
            updated_by: self.actor.user_id.clone(),
            update_date: rfc3339(now),
        };

        let loading = self.notifier.show(NoticeLevel::Loading, "Updating status...");
        let result = self.gateway.update_status(id, &change).await;
        self.notifier.dismiss(loading);

        match result {
            Ok(()) => {
                list.apply_status(id, status, now);
                info!(
                    complaint_id = %id,
                    status = %status,
                    by = %self.actor.user_id,
                    "Complaint status changed"
                );
                self.notifier.show(
                    NoticeLevel::Success,
                    &format!("Complaint marked as {status}"),
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    complaint_id = %id,
                    code = e.error_code(),
                    error = %e,
                    "Failed to update complaint status"
                );
                self.notifier
                    .show(NoticeLevel::Error, e.server_message().unwrap_or(STATUS_FAILED));
                Err(e)
            }
        }
    }

    /// Add a comment to complaint `id`.
    ///
    /// Whitespace-only text is rejected before any request is made. Other
    /// text is sent as typed.
    pub async fn add_comment(
        &self,
        list: &mut ComplaintList,
        id: &str,
        text: &str,
    ) -> AppResult<Comment> {
        self.ensure_admin()?;

        if text.trim().is_empty() {
            self.notifier.show(NoticeLevel::Error, EMPTY_COMMENT);
            return Err(AppError::Validation(EMPTY_COMMENT.to_string()));
        }

        let now = Utc::now();
        let request = NewComment {
            user_id: self.actor.user_id.clone(),
            user_name: self.actor.user_name.clone(),
            user_role: self.actor.role,
            content: text.to_string(),
            created_at: rfc3339(now),
            complaint_id: id.to_string(),
        };

        let loading = self.notifier.show(NoticeLevel::Loading, "Adding comment...");
        let result = self.gateway.add_comment(id, &request).await;
        self.notifier.dismiss(loading);

        match result {
            Ok(echo) => {
                let comment = echo
                    .filter(|v| v.get("content").is_some())
                    .and_then(|v| normalize_comment(&v, id))
                    .unwrap_or_else(|| Comment {
                        id: None,
                        user_id: request.user_id,
                        user_name: request.user_name,
                        user_role: request.user_role,
                        content: request.content,
                        created_at: Some(now),
                        complaint_id: Some(request.complaint_id),
                    });
                list.append_comment(id, comment.clone(), now);
                info!(complaint_id = %id, by = %self.actor.user_id, "Comment added");
                self.notifier.show(NoticeLevel::Success, COMMENT_ADDED);
                Ok(comment)
            }
            Err(e) => {
                error!(
                    complaint_id = %id,
                    code = e.error_code(),
                    error = %e,
                    "Failed to add comment"
                );
                self.notifier
                    .show(NoticeLevel::Error, e.server_message().unwrap_or(COMMENT_FAILED));
                Err(e)
            }
        }
    }

    fn ensure_admin(&self) -> AppResult<()> {
        if self.actor.role.is_admin() {
            return Ok(());
        }
        let message = "Only administrators can change complaints";
        self.notifier.show(NoticeLevel::Error, message);
        Err(AppError::Forbidden(message.to_string()))
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
