//! User lookup repository.

use std::sync::Arc;

use campus_common::AppResult;
use serde_json::Value;

use crate::document::DocumentStore;

/// Profile document stored per signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// User identifier from the identity provider.
    pub id: String,
    /// Raw role string (`admin`, `student`, ...).
    pub role: Option<String>,
    /// Student roll number, when it differs from the user id.
    pub student_id: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Read access to the users collection.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

fn string_field(data: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Find the profile document for `user_id`.
    pub async fn find_by_id(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let Some(doc) = self.store.get(&self.collection, user_id).await? else {
            return Ok(None);
        };

        Ok(Some(UserRecord {
            id: doc.id,
            role: string_field(&doc.data, "role"),
            student_id: string_field(&doc.data, "studentId"),
            name: string_field(&doc.data, "name")
                .or_else(|| string_field(&doc.data, "displayName")),
        }))
    }
}
