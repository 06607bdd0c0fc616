//! List state: the fetched collection, the current query and the derived view.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::models::{Category, Comment, Complaint, Status};
use crate::normalize::{NormalizeOptions, normalize_all};
use crate::notify::{NoticeLevel, Notifier};
use crate::pipeline::{
    CategoryFilter, ListQuery, SortOrder, StatusCounts, StatusFilter, apply_indices,
};
use crate::source::ComplaintSource;

/// Message shown when a fetch fails.
pub const LOAD_FAILED: &str = "Failed to load complaints";

/// Fetch state of a list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing fetched yet, or a refresh is running.
    #[default]
    Loading,
    /// The collection is current.
    Ready,
    /// The last fetch failed with this message.
    Failed(String),
}

/// Owns a complaint collection and keeps its filtered view current.
///
/// Every setter recomputes the view; nothing is cached across queries.
#[derive(Debug, Clone, Default)]
pub struct ComplaintList {
    items: Vec<Complaint>,
    query: ListQuery,
    view: Vec<usize>,
    phase: LoadPhase,
    options: NormalizeOptions,
}

impl ComplaintList {
    /// An empty list using `query`.
    #[must_use]
    pub fn new(query: ListQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    /// Normalization options applied on refresh.
    #[must_use]
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the collection.
    pub fn set_items(&mut self, items: Vec<Complaint>) {
        self.items = items;
        self.phase = LoadPhase::Ready;
        self.recompute();
    }

    /// Fetch from `source`, normalize and replace the collection.
    ///
    /// On failure the previous collection is kept, the phase becomes
    /// [`LoadPhase::Failed`] and an error notice is shown.
    pub async fn refresh(&mut self, source: &dyn ComplaintSource, notifier: &dyn Notifier) {
        self.phase = LoadPhase::Loading;
        match source.fetch_raw().await {
            Ok(raw) => {
                let items = normalize_all(&raw, &self.options);
                info!(fetched = raw.len(), kept = items.len(), "Complaints loaded");
                self.set_items(items);
            }
            Err(e) => {
                warn!(error = %e, remote = e.is_remote(), "Failed to fetch complaints");
                self.phase = LoadPhase::Failed(LOAD_FAILED.to_string());
                notifier.show(NoticeLevel::Error, LOAD_FAILED);
            }
        }
    }

    /// Current query.
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Replace the whole query.
    pub fn set_query(&mut self, query: ListQuery) {
        self.query = query;
        self.recompute();
    }

    /// Change the status tab.
    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
        self.recompute();
    }

    /// Change the category filter.
    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.query.category = category;
        self.recompute();
    }

    /// Change the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.recompute();
    }

    /// Change the sort.
    pub fn set_sort(&mut self, sort: Option<SortOrder>) {
        self.query.sort = sort;
        self.recompute();
    }

    /// Fetch state.
    #[must_use]
    pub const fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    /// The full collection, in source order.
    #[must_use]
    pub fn items(&self) -> &[Complaint] {
        &self.items
    }

    /// The filtered, sorted view.
    #[must_use]
    pub fn visible(&self) -> Vec<&Complaint> {
        self.view.iter().map(|&i| &self.items[i]).collect()
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Look up a complaint by id in the full collection.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Complaint> {
        self.items.iter().find(|c| c.id == id)
    }

    /// Tab counts over the full collection.
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.items)
    }

    /// Categories present in the collection, known ones first.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        let mut found: Vec<Category> = Category::KNOWN
            .into_iter()
            .filter(|known| self.items.iter().any(|c| &c.category == known))
            .collect();
        for complaint in &self.items {
            if !found.contains(&complaint.category) {
                found.push(complaint.category.clone());
            }
        }
        found
    }

    /// Patch a confirmed status change. Returns `false` for unknown ids.
    pub fn apply_status(&mut self, id: &str, status: Status, at: DateTime<Utc>) -> bool {
        let Some(complaint) = self.items.iter_mut().find(|c| c.id == id) else {
            warn!(complaint_id = %id, "Status change for complaint not in list");
            return false;
        };
        complaint.status = status;
        complaint.updated_at = Some(at);
        self.recompute();
        true
    }

    /// Patch a confirmed new comment. Returns `false` for unknown ids.
    pub fn append_comment(&mut self, id: &str, comment: Comment, at: DateTime<Utc>) -> bool {
        let Some(complaint) = self.items.iter_mut().find(|c| c.id == id) else {
            warn!(complaint_id = %id, "Comment for complaint not in list");
            return false;
        };
        complaint.comments.push(comment);
        complaint.updated_at = Some(at);
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        self.view = apply_indices(&self.items, &self.query);
    }
}
