//! Where complaint records come from.

use async_trait::async_trait;
use campus_common::AppResult;
use campus_store::ComplaintRepository;
use serde_json::Value;

/// A source of raw complaint records.
#[async_trait]
pub trait ComplaintSource: Send + Sync {
    /// Fetch every record visible to the caller, unparsed.
    async fn fetch_raw(&self) -> AppResult<Vec<Value>>;
}

/// Which records a [`StoreSource`] reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreScope {
    /// The whole collection (admin view).
    All,
    /// Complaints submitted by one student.
    Student(String),
}

/// Reads complaints straight from the document store, newest first.
#[derive(Clone)]
pub struct StoreSource {
    repo: ComplaintRepository,
    scope: StoreScope,
}

impl StoreSource {
    /// Create a source over `repo` limited to `scope`.
    #[must_use]
    pub const fn new(repo: ComplaintRepository, scope: StoreScope) -> Self {
        Self { repo, scope }
    }
}

#[async_trait]
impl ComplaintSource for StoreSource {
    async fn fetch_raw(&self) -> AppResult<Vec<Value>> {
        match &self.scope {
            StoreScope::All => self.repo.list_all().await,
            StoreScope::Student(student_id) => self.repo.list_for_student(student_id).await,
        }
    }
}
