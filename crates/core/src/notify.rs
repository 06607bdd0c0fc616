//! User-visible notices (toasts).

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Kind of notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum NoticeLevel {
    Loading,
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        })
    }
}

/// Handle for dismissing a notice.
pub type NoticeId = u64;

/// A notice as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Handle returned by [`Notifier::show`].
    pub id: NoticeId,
    /// Kind.
    pub level: NoticeLevel,
    /// Text.
    pub message: String,
}

/// Sink for notices.
pub trait Notifier: Send + Sync {
    /// Show a notice and return a handle for dismissing it.
    fn show(&self, level: NoticeLevel, message: &str) -> NoticeId;

    /// Remove a notice. Unknown ids are ignored.
    fn dismiss(&self, id: NoticeId);
}

/// Notifier that records every notice, keeping dismissed ones apart.
#[derive(Debug, Default)]
pub struct NoticeLog {
    next_id: AtomicU64,
    entries: Mutex<Vec<(Notice, bool)>>,
}

impl NoticeLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices not yet dismissed, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        self.lock()
            .iter()
            .filter(|(_, dismissed)| !dismissed)
            .map(|(notice, _)| notice.clone())
            .collect()
    }

    /// Every notice ever shown, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Notice> {
        self.lock().iter().map(|(notice, _)| notice.clone()).collect()
    }

    /// The most recent notice, dismissed or not.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.lock().last().map(|(notice, _)| notice.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Notice, bool)>> {
        // A panic while holding the lock leaves the Vec intact.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for NoticeLog {
    fn show(&self, level: NoticeLevel, message: &str) -> NoticeId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().push((
            Notice {
                id,
                level,
                message: message.to_string(),
            },
            false,
        ));
        id
    }

    fn dismiss(&self, id: NoticeId) {
        if let Some(entry) = self.lock().iter_mut().find(|(n, _)| n.id == id) {
            entry.1 = true;
        }
    }
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    next_id: AtomicU64,
}

impl Notifier for TracingNotifier {
    fn show(&self, level: NoticeLevel, message: &str) -> NoticeId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        match level {
            NoticeLevel::Error => tracing::error!(notice = id, "{message}"),
            NoticeLevel::Loading => tracing::debug!(notice = id, "{message}"),
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!(notice = id, "{message}"),
        }
        id
    }

    fn dismiss(&self, id: NoticeId) {
        tracing::trace!(notice = id, "Notice dismissed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_dismiss() {
        let log = NoticeLog::new();
        let loading = log.show(NoticeLevel::Loading, "Updating status...");
        let done = log.show(NoticeLevel::Success, "Complaint marked as resolved");
        assert_ne!(loading, done);
        assert_eq!(log.active().len(), 2);

        log.dismiss(loading);
        log.dismiss(999);
        let active = log.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].level, NoticeLevel::Success);
        assert_eq!(log.history().len(), 2);
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Complaint marked as resolved".to_string())
        );
    }
}
