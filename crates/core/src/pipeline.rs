//! Pure filter/sort pipeline over a complaint collection.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Category, Complaint, Status};

/// Status tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every status.
    #[default]
    All,
    /// Only complaints in this status.
    Only(Status),
}

impl StatusFilter {
    /// Whether a complaint in `status` passes.
    #[must_use]
    pub fn accepts(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => status.fmt(f),
        }
    }
}

/// Category dropdown selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// Only complaints tagged with this category.
    Only(Category),
}

impl CategoryFilter {
    /// Whether a complaint tagged `category` passes.
    #[must_use]
    pub fn accepts(&self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(Category::from_tag(s)))
        }
    }
}

/// Ordering by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!("unknown sort {other:?} (expected newest or oldest)")),
        }
    }
}

/// Which fields the search text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Title and description.
    #[default]
    Content,
    /// Title, description, student name and student id.
    ContentAndStudent,
}

/// Inputs of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Status filter.
    pub status: StatusFilter,
    /// Category filter.
    pub category: CategoryFilter,
    /// Free-text search; blank matches everything.
    pub search: String,
    /// Sort; `None` keeps collection order.
    pub sort: Option<SortOrder>,
    /// Search scope.
    pub scope: SearchScope,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            category: CategoryFilter::All,
            search: String::new(),
            sort: Some(SortOrder::Newest),
            scope: SearchScope::Content,
        }
    }
}

impl ListQuery {
    /// Admin table defaults: no re-sort (the source already orders newest
    /// first) and search over student fields too.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            sort: None,
            scope: SearchScope::ContentAndStudent,
            ..Self::default()
        }
    }

    /// Whether one complaint passes every filter.
    #[must_use]
    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.passes(complaint, &self.needle())
    }

    /// Trimmed, lowercased search text.
    fn needle(&self) -> String {
        self.search.trim().to_lowercase()
    }

    fn passes(&self, complaint: &Complaint, needle: &str) -> bool {
        self.status.accepts(complaint.status)
            && self.category.accepts(&complaint.category)
            && matches_search(complaint, needle, self.scope)
    }
}

fn matches_search(complaint: &Complaint, needle: &str, scope: SearchScope) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    if contains(&complaint.title) || contains(&complaint.description) {
        return true;
    }
    match scope {
        SearchScope::Content => false,
        SearchScope::ContentAndStudent => {
            complaint.student_name.as_deref().is_some_and(contains)
                || complaint.student_id.as_deref().is_some_and(contains)
        }
    }
}

fn compare_created(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    // None < Some(_), so undated complaints sort as the earliest.
    a.cmp(&b)
}

/// Indices into `items` of the complaints that pass `query`, in view order.
#[must_use]
pub fn apply_indices(items: &[Complaint], query: &ListQuery) -> Vec<usize> {
    let needle = query.needle();
    let mut indices: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, c)| query.passes(c, &needle))
        .map(|(i, _)| i)
        .collect();

    match query.sort {
        Some(SortOrder::Newest) => indices
            .sort_by(|&a, &b| compare_created(items[b].created_at, items[a].created_at)),
        Some(SortOrder::Oldest) => indices
            .sort_by(|&a, &b| compare_created(items[a].created_at, items[b].created_at)),
        None => {}
    }
    indices
}

/// The complaints that pass `query`, in view order.
#[must_use]
pub fn apply<'a>(items: &'a [Complaint], query: &ListQuery) -> Vec<&'a Complaint> {
    apply_indices(items, query)
        .into_iter()
        .map(|i| &items[i])
        .collect()
}

/// Per-status tab counts over a whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    /// Count `items` by status.
    #[must_use]
    pub fn tally(items: &[Complaint]) -> Self {
        items.iter().fold(Self::default(), |mut counts, c| {
            counts.all += 1;
            match c.status {
                Status::Pending => counts.pending += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Resolved => counts.resolved += 1,
                Status::Rejected => counts.rejected += 1,
            }
            counts
        })
    }

    /// Count for one tab.
    #[must_use]
    pub const fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Only(Status::Pending) => self.pending,
            StatusFilter::Only(Status::InProgress) => self.in_progress,
            StatusFilter::Only(Status::Resolved) => self.resolved,
            StatusFilter::Only(Status::Rejected) => self.rejected,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn complaint(id: &str, status: Status, category: Category, day: Option<u32>) -> Complaint {
        let mut c = Complaint::new(id, format!("Title {id}"), format!("Details for {id}"));
        c.status = status;
        c.category = category;
        c.created_at = day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap());
        c
    }

    fn five() -> Vec<Complaint> {
        vec![
            complaint("a", Status::Resolved, Category::Hostel, Some(1)),
            complaint("b", Status::Pending, Category::Mess, Some(5)),
            complaint("c", Status::Resolved, Category::Academic, Some(9)),
            complaint("d", Status::InProgress, Category::Hostel, Some(3)),
            complaint("e", Status::Resolved, Category::Mess, Some(7)),
        ]
    }

    fn ids(view: &[&Complaint]) -> Vec<String> {
        view.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_status_filter_newest_first() {
        let items = five();
        let query = ListQuery {
            status: StatusFilter::Only(Status::Resolved),
            ..ListQuery::default()
        };
        assert_eq!(ids(&apply(&items, &query)), vec!["c", "e", "a"]);
    }

    #[test]
    fn test_category_and_oldest() {
        let items = five();
        let query = ListQuery {
            category: CategoryFilter::Only(Category::Hostel),
            sort: Some(SortOrder::Oldest),
            ..ListQuery::default()
        };
        assert_eq!(ids(&apply(&items, &query)), vec!["a", "d"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_trimmed() {
        let mut items = five();
        items[3].description = "Broken WINDOW in block B".to_string();
        let query = ListQuery {
            search: "  window ".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(ids(&apply(&items, &query)), vec!["d"]);
    }

    #[test]
    fn test_admin_scope_searches_student_fields() {
        let mut items = five();
        items[1].student_name = Some("Ravi Kumar".to_string());
        items[4].student_id = Some("stu-ravi".to_string());

        let content_only = ListQuery {
            search: "ravi".to_string(),
            ..ListQuery::default()
        };
        assert!(apply(&items, &content_only).is_empty());

        let admin = ListQuery {
            search: "ravi".to_string(),
            ..ListQuery::admin()
        };
        // Admin view keeps collection order.
        assert_eq!(ids(&apply(&items, &admin)), vec!["b", "e"]);
    }

    #[test]
    fn test_undated_sort_earliest_and_ties_stable() {
        let items = vec![
            complaint("x", Status::Pending, Category::General, None),
            complaint("y", Status::Pending, Category::General, Some(2)),
            complaint("z", Status::Pending, Category::General, Some(2)),
            complaint("w", Status::Pending, Category::General, None),
        ];
        let newest = apply(&items, &ListQuery::default());
        assert_eq!(ids(&newest), vec!["y", "z", "x", "w"]);

        let oldest = ListQuery {
            sort: Some(SortOrder::Oldest),
            ..ListQuery::default()
        };
        assert_eq!(ids(&apply(&items, &oldest)), vec!["x", "w", "y", "z"]);
    }

    #[test]
    fn test_output_is_filtered_subset_and_monotonic() {
        let items = five();
        let statuses = std::iter::once(StatusFilter::All)
            .chain(Status::ALL.into_iter().map(StatusFilter::Only));
        let categories = [
            CategoryFilter::All,
            CategoryFilter::Only(Category::Hostel),
            CategoryFilter::Only(Category::Mess),
            CategoryFilter::Only(Category::Other("sports".into())),
        ];

        for status in statuses {
            for category in &categories {
                for search in ["", "TITLE C", "  details for e "] {
                    for sort in [SortOrder::Newest, SortOrder::Oldest] {
                        let query = ListQuery {
                            status,
                            category: category.clone(),
                            search: search.to_string(),
                            sort: Some(sort),
                            ..ListQuery::default()
                        };
                        let view = apply(&items, &query);
                        let needle = search.trim().to_lowercase();

                        for c in &view {
                            assert!(status.accepts(c.status));
                            assert!(category.accepts(&c.category));
                            assert!(
                                needle.is_empty()
                                    || c.title.to_lowercase().contains(&needle)
                                    || c.description.to_lowercase().contains(&needle)
                            );
                        }
                        let expected = items.iter().filter(|c| query.matches(c)).count();
                        assert_eq!(view.len(), expected);

                        let pairs_ok = view.windows(2).all(|w| match sort {
                            SortOrder::Newest => w[0].created_at >= w[1].created_at,
                            SortOrder::Oldest => w[0].created_at <= w[1].created_at,
                        });
                        assert!(pairs_ok);
                    }
                }
            }
        }
    }

    #[test]
    fn test_counts() {
        let counts = StatusCounts::tally(&five());
        assert_eq!(counts.all, 5);
        assert_eq!(counts.get(StatusFilter::Only(Status::Resolved)), 3);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.rejected, 0);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "in-progress".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::InProgress)
        );
        assert!("closed".parse::<StatusFilter>().is_err());
        assert_eq!(
            "Mess".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Mess)
        );
        assert_eq!("oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
