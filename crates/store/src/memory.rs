//! In-memory document store.
//!
//! Backs tests, demos and offline runs from a JSON snapshot of the hosted
//! store (`{ "<collection>": { "<id>": { ...fields } } }`).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use campus_common::{AppError, AppResult};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

use crate::document::{
    Direction, Document, DocumentStore, FieldUpdate, Query, StoredDocument, compare_values,
};

type Collection = BTreeMap<String, Document>;

/// Document store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot value.
    pub fn from_snapshot(snapshot: Value) -> AppResult<Self> {
        let Value::Object(collections) = snapshot else {
            return Err(AppError::Store(
                "snapshot must be an object of collections".to_string(),
            ));
        };

        let mut loaded = HashMap::with_capacity(collections.len());
        for (name, docs) in collections {
            let Value::Object(docs) = docs else {
                return Err(AppError::Store(format!(
                    "collection {name} must be an object keyed by document id"
                )));
            };
            let mut collection = Collection::new();
            for (id, data) in docs {
                match data {
                    Value::Object(data) => {
                        collection.insert(id, data);
                    }
                    _ => {
                        return Err(AppError::Store(format!(
                            "document {name}/{id} must be an object"
                        )));
                    }
                }
            }
            loaded.insert(name, collection);
        }

        Ok(Self {
            collections: RwLock::new(loaded),
        })
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Store(format!("{}: {e}", path.as_ref().display()))
        })?;
        let snapshot: Value = serde_json::from_str(&raw)
            .map_err(|e| AppError::Store(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_snapshot(snapshot)
    }

    /// Export every collection in the shape [`Self::from_snapshot`] reads.
    pub async fn snapshot(&self) -> Value {
        let collections = self.collections.read().await;
        let mut out = serde_json::Map::with_capacity(collections.len());
        for (name, docs) in collections.iter() {
            let docs: serde_json::Map<String, Value> = docs
                .iter()
                .map(|(id, data)| (id.clone(), Value::Object(data.clone())))
                .collect();
            out.insert(name.clone(), Value::Object(docs));
        }
        Value::Object(out)
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| StoredDocument {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> AppResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<StoredDocument> = docs
            .iter()
            .filter(|(_, data)| query.matches(data))
            .filter(|(_, data)| {
                query
                    .order_by
                    .as_ref()
                    .is_none_or(|(field, _)| data.contains_key(field))
            })
            .map(|(id, data)| StoredDocument {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|a, b| {
                let ordering = compare_values(&a.data[field], &b.data[field]);
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        debug!(
            collection = %query.collection,
            filters = query.filters.len(),
            results = results.len(),
            "Document query"
        );

        Ok(results)
    }

    async fn add(&self, collection: &str, data: Document) -> AppResult<String> {
        // Lowercase ULIDs sort by creation time when listed by key.
        let id = Ulid::new().to_string().to_lowercase();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> AppResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: Vec<FieldUpdate>,
    ) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(false);
        };
        for change in changes {
            change.apply(doc);
        }
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    async fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        store
            .set(
                "complaints",
                "a",
                doc(json!({"studentId": "s1", "createdAt": {"seconds": 100}})),
            )
            .await
            .unwrap();
        store
            .set(
                "complaints",
                "b",
                doc(json!({"studentId": "s2", "createdAt": {"seconds": 300}})),
            )
            .await
            .unwrap();
        store
            .set(
                "complaints",
                "c",
                doc(json!({"studentId": "s1", "createdAt": {"seconds": 200}})),
            )
            .await
            .unwrap();
        store
            .set("complaints", "d", doc(json!({"studentId": "s1"})))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_query_order_desc() {
        let store = seeded().await;
        let query = Query::collection("complaints").order_by("createdAt", Direction::Descending);
        let ids: Vec<_> = store
            .query(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        // "d" has no createdAt and is excluded from the ordered query.
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_query_filter_and_limit() {
        let store = seeded().await;
        let query = Query::collection("complaints")
            .where_eq("studentId", "s1")
            .order_by("createdAt", Direction::Ascending)
            .limit(1);
        let docs = store.query(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");

        let unordered = Query::collection("complaints").where_eq("studentId", "s1");
        assert_eq!(store.query(&unordered).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        let docs = store.query(&Query::collection("nothing")).await.unwrap();
        assert!(docs.is_empty());
        assert!(store.get("nothing", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_generates_id() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .add("complaints", doc(json!({"title": "Broken fan"})))
            .await
            .unwrap();
        let fetched = store.get("complaints", &id).await.unwrap().unwrap();
        assert_eq!(fetched.data["title"], "Broken fan");
        assert_eq!(store.len("complaints").await, 1);
    }

    #[tokio::test]
    async fn test_from_snapshot() {
        let store = InMemoryDocumentStore::from_snapshot(json!({
            "users": {"u1": {"role": "admin"}},
            "complaints": {}
        }))
        .unwrap();
        assert_eq!(store.len("users").await, 1);
        assert_eq!(store.len("complaints").await, 0);

        assert!(InMemoryDocumentStore::from_snapshot(json!([])).is_err());
        assert!(InMemoryDocumentStore::from_snapshot(json!({"users": []})).is_err());
        assert!(InMemoryDocumentStore::from_snapshot(json!({"users": {"u1": 3}})).is_err());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = seeded().await;
        let found = store
            .update(
                "complaints",
                "a",
                vec![
                    FieldUpdate::set("status", "resolved"),
                    FieldUpdate::append("updates", json!({"status": "resolved"})),
                    FieldUpdate::append("updates", json!({"status": "rejected"})),
                ],
            )
            .await
            .unwrap();
        assert!(found);

        let doc = store.get("complaints", "a").await.unwrap().unwrap();
        assert_eq!(doc.data["status"], "resolved");
        assert_eq!(doc.data["studentId"], "s1");
        assert_eq!(doc.data["updates"].as_array().unwrap().len(), 2);

        let missing = store
            .update("complaints", "zz", vec![FieldUpdate::set("status", "x")])
            .await
            .unwrap();
        assert!(!missing);
        assert!(store.get("complaints", "zz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_reloads() {
        let original = json!({
            "users": {"u1": {"role": "admin"}},
            "complaints": {"c1": {"title": "Leak", "createdAt": {"seconds": 5}}}
        });
        let store = InMemoryDocumentStore::from_snapshot(original.clone()).unwrap();
        let exported = store.snapshot().await;
        assert_eq!(exported, original);

        let reloaded = InMemoryDocumentStore::from_snapshot(exported).unwrap();
        assert_eq!(reloaded.len("complaints").await, 1);
    }
}
