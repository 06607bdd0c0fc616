//! Document model and query description.

use std::cmp::Ordering;

use async_trait::async_trait;
use campus_common::AppResult;
use serde_json::{Map, Value};

/// Field map of a single document.
pub type Document = Map<String, Value>;

/// A document together with its key inside the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document key.
    pub id: String,
    /// Document fields.
    pub data: Document,
}

impl StoredDocument {
    /// Flatten into a single JSON object with the key under `id`.
    ///
    /// The document key wins over a stored `id` field.
    #[must_use]
    pub fn into_record(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Value::Object(data)
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Equality filter on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Field name.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

/// A collection query: equality filters, one ordering, optional limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to read.
    pub collection: String,
    /// Equality filters, all of which must hold.
    pub filters: Vec<FieldFilter>,
    /// Field and direction to order by.
    pub order_by: Option<(String, Direction)>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query over `collection`.
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Keep only documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by `field`.
    ///
    /// As in hosted document stores, documents that lack the field are
    /// excluded from an ordered query.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` passes every equality filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|f| doc.get(&f.field).is_some_and(|v| v == &f.value))
    }
}

/// One field-level change inside [`DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite `field` with `value`.
    Set {
        /// Field name.
        field: String,
        /// New value.
        value: Value,
    },
    /// Push `value` onto the array at `field`, creating the array when the
    /// field is missing or not an array.
    Append {
        /// Field name.
        field: String,
        /// Element to push.
        value: Value,
    },
}

impl FieldUpdate {
    /// Overwrite a field.
    #[must_use]
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Append to an array field.
    #[must_use]
    pub fn append(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Append {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Apply the change to `doc`.
    pub fn apply(self, doc: &mut Document) {
        match self {
            Self::Set { field, value } => {
                doc.insert(field, value);
            }
            Self::Append { field, value } => match doc.get_mut(&field) {
                Some(Value::Array(items)) => items.push(value),
                _ => {
                    doc.insert(field, Value::Array(vec![value]));
                }
            },
        }
    }
}

/// Client for a document store.
///
/// The hosted store behind the production app is opaque to this crate; the
/// trait describes the handful of calls the application makes against it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by key.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>>;

    /// Run a query.
    async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>>;

    /// Insert a document under a generated key and return the key.
    async fn add(&self, collection: &str, data: Document) -> AppResult<String>;

    /// Create or replace a document under `id`.
    async fn set(&self, collection: &str, id: &str, data: Document) -> AppResult<()>;

    /// Apply field-level changes to an existing document as one atomic write.
    ///
    /// Fields not named in `changes` are left untouched. Returns `false`
    /// without writing when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Vec<FieldUpdate>,
    ) -> AppResult<bool>;
}

/// Sort key following the cross-type order hosted stores use:
/// null < bool < number < timestamp < string < everything else.
#[derive(Debug, PartialEq, PartialOrd)]
enum OrderKey<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(i64, i64),
    Text(&'a str),
    Other,
}

fn order_key(value: &Value) -> OrderKey<'_> {
    match value {
        Value::Null => OrderKey::Null,
        Value::Bool(b) => OrderKey::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(OrderKey::Other, OrderKey::Number),
        Value::String(s) => OrderKey::Text(s),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64);
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            seconds.map_or(OrderKey::Other, |s| OrderKey::Timestamp(s, nanos))
        }
        Value::Array(_) => OrderKey::Other,
    }
}

/// Compare two field values the way an ordered query does.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    order_key(a)
        .partial_cmp(&order_key(b))
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cross_type_order() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(true), &json!(3)), Ordering::Less);
        assert_eq!(
            compare_values(&json!(10), &json!({"seconds": 1})),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&json!({"seconds": 1}), &json!("2024-01-01")),
            Ordering::Less
        );
    }

    #[test]
    fn test_timestamp_order() {
        let a = json!({"seconds": 100, "nanoseconds": 5});
        let b = json!({"_seconds": 100, "_nanoseconds": 6});
        assert_eq!(compare_values(&a, &b), Ordering::Less);
        assert_eq!(
            compare_values(&json!("2024-05-01T00:00:00Z"), &json!("2024-04-30T23:00:00Z")),
            Ordering::Greater
        );
    }

    #[test]
    fn test_query_matches() {
        let query = Query::collection("complaints").where_eq("studentId", "s1");
        let mut doc = Document::new();
        assert!(!query.matches(&doc));
        doc.insert("studentId".into(), json!("s1"));
        assert!(query.matches(&doc));
        doc.insert("studentId".into(), json!("s2"));
        assert!(!query.matches(&doc));
    }

    #[test]
    fn test_into_record_injects_id() {
        let mut data = Document::new();
        data.insert("title".into(), json!("Leaking tap"));
        data.insert("id".into(), json!("stale"));
        let record = StoredDocument {
            id: "abc".into(),
            data,
        }
        .into_record();
        assert_eq!(record["id"], "abc");
        assert_eq!(record["title"], "Leaking tap");
    }
}
