//! Complaint repository.

use std::sync::Arc;

use campus_common::{AppError, AppResult};
use serde_json::Value;
use tracing::debug;

use crate::document::{Direction, Document, DocumentStore, FieldUpdate, Query, StoredDocument};

/// Field complaints are ordered by.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Field holding the submitting student's identifier.
pub const STUDENT_ID_FIELD: &str = "studentId";

/// Read access to the complaints collection.
///
/// Records are returned raw (`id` injected) because the stored shapes are not
/// reliable; typing happens in the normalization step.
#[derive(Clone)]
pub struct ComplaintRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// All complaints, newest first.
    pub async fn list_all(&self) -> AppResult<Vec<Value>> {
        let query = Query::collection(&self.collection)
            .order_by(CREATED_AT_FIELD, Direction::Descending);
        self.run(query).await
    }

    /// Complaints submitted by one student, newest first.
    pub async fn list_for_student(&self, student_id: &str) -> AppResult<Vec<Value>> {
        if student_id.trim().is_empty() {
            return Err(AppError::Validation(
                "Student identifier is required".to_string(),
            ));
        }
        let query = Query::collection(&self.collection)
            .where_eq(STUDENT_ID_FIELD, student_id)
            .order_by(CREATED_AT_FIELD, Direction::Descending);
        self.run(query).await
    }

    /// One complaint by id.
    pub async fn get(&self, id: &str) -> AppResult<Value> {
        self.store
            .get(&self.collection, id)
            .await?
            .map(StoredDocument::into_record)
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Set a complaint's status and append an entry to its `updates` history.
    ///
    /// `at` is written verbatim to `updatedAt` and to the history entry.
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        updated_by: &str,
        at: &str,
    ) -> AppResult<()> {
        let mut entry = Document::new();
        entry.insert("by".to_string(), Value::from(updated_by));
        entry.insert("date".to_string(), Value::from(at));
        entry.insert("status".to_string(), Value::from(status));

        self.write(
            id,
            vec![
                FieldUpdate::set("status", status),
                FieldUpdate::set("updatedBy", updated_by),
                FieldUpdate::set("updatedAt", at),
                FieldUpdate::append("updates", Value::Object(entry)),
            ],
        )
        .await?;
        debug!(complaint_id = %id, status = %status, "Complaint status stored");
        Ok(())
    }

    /// Append a comment object to a complaint's `comments` array.
    pub async fn append_comment(&self, id: &str, comment: Value) -> AppResult<()> {
        self.write(id, vec![FieldUpdate::append("comments", comment)]).await?;
        debug!(complaint_id = %id, "Complaint comment stored");
        Ok(())
    }

    async fn write(&self, id: &str, changes: Vec<FieldUpdate>) -> AppResult<()> {
        if self.store.update(&self.collection, id, changes).await? {
            Ok(())
        } else {
            Err(AppError::ComplaintNotFound(id.to_string()))
        }
    }

    async fn run(&self, query: Query) -> AppResult<Vec<Value>> {
        let docs = self.store.query(&query).await?;
        debug!(collection = %self.collection, count = docs.len(), "Fetched complaints");
        Ok(docs
            .into_iter()
            .map(StoredDocument::into_record)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDocumentStore;
    use async_trait::async_trait;
    use serde_json::json;

    /// Delegating store that yields to the scheduler before every call, so
    /// concurrent writers interleave.
    struct YieldingStore(InMemoryDocumentStore);

    #[async_trait]
    impl DocumentStore for YieldingStore {
        async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
            tokio::task::yield_now().await;
            self.0.get(collection, id).await
        }

        async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>> {
            tokio::task::yield_now().await;
            self.0.query(query).await
        }

        async fn add(&self, collection: &str, data: Document) -> AppResult<String> {
            tokio::task::yield_now().await;
            self.0.add(collection, data).await
        }

        async fn set(&self, collection: &str, id: &str, data: Document) -> AppResult<()> {
            tokio::task::yield_now().await;
            self.0.set(collection, id, data).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &str,
            changes: Vec<FieldUpdate>,
        ) -> AppResult<bool> {
            tokio::task::yield_now().await;
            self.0.update(collection, id, changes).await
        }
    }

    fn repo() -> ComplaintRepository {
        let store = InMemoryDocumentStore::from_snapshot(json!({
            "complaints": {
                "c1": {"title": "Mess food", "studentId": "s1", "createdAt": "2024-03-01T10:00:00Z"},
                "c2": {"title": "Hostel wifi", "studentId": "s2", "createdAt": "2024-03-03T10:00:00Z"},
                "c3": {"title": "Library hours", "studentId": "s1", "createdAt": "2024-03-02T10:00:00Z"}
            }
        }))
        .unwrap();
        ComplaintRepository::new(Arc::new(store), "complaints")
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let records = repo().list_all().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c2", "c3", "c1"]);
    }

    #[tokio::test]
    async fn test_list_for_student() {
        let records = repo().list_for_student("s1").await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c3", "c1"]);

        assert!(matches!(
            repo().list_for_student("  ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_status_appends_history() {
        let repo = repo();
        repo.update_status("c1", "resolved", "admin", "2024-03-04T08:00:00Z")
            .await
            .unwrap();
        repo.update_status("c1", "rejected", "warden", "2024-03-05T08:00:00Z")
            .await
            .unwrap();

        let record = repo.get("c1").await.unwrap();
        assert_eq!(record["status"], "rejected");
        assert_eq!(record["updatedBy"], "warden");
        assert_eq!(record["updatedAt"], "2024-03-05T08:00:00Z");
        assert_eq!(record["updates"].as_array().unwrap().len(), 2);
        assert_eq!(record["updates"][0]["status"], "resolved");
        assert_eq!(record["createdAt"], "2024-03-01T10:00:00Z");

        assert!(matches!(
            repo.update_status("missing", "resolved", "admin", "x").await,
            Err(AppError::ComplaintNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_append_comment() {
        let repo = repo();
        repo.append_comment("c2", json!({"content": "Router replaced"}))
            .await
            .unwrap();
        let record = repo.get("c2").await.unwrap();
        assert_eq!(record["comments"][0]["content"], "Router replaced");
    }

    #[tokio::test]
    async fn test_concurrent_status_and_comment_both_stored() {
        let store = InMemoryDocumentStore::from_snapshot(json!({
            "complaints": {"c1": {"title": "Mess food", "status": "pending"}}
        }))
        .unwrap();
        let repo = ComplaintRepository::new(Arc::new(YieldingStore(store)), "complaints");

        let (status, comment) = tokio::join!(
            repo.update_status("c1", "resolved", "admin", "2024-03-04T08:00:00Z"),
            repo.append_comment("c1", json!({"content": "On it"})),
        );
        status.unwrap();
        comment.unwrap();

        let record = repo.get("c1").await.unwrap();
        assert_eq!(record["status"], "resolved");
        assert_eq!(record["updates"].as_array().unwrap().len(), 1);
        assert_eq!(record["comments"][0]["content"], "On it");
        assert_eq!(record["title"], "Mess food");
    }

    #[tokio::test]
    async fn test_get() {
        let record = repo().get("c2").await.unwrap();
        assert_eq!(record["title"], "Hostel wifi");
        assert!(matches!(
            repo().get("missing").await,
            Err(AppError::ComplaintNotFound(_))
        ));
    }
}
