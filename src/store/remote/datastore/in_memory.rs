use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::store::constants::MAX_IN_FILTER_SIZE;
use crate::store::error::{internal_error, invalid_argument, not_found, StoreResult};
use crate::store::model::DocumentKey;
use crate::store::snapshot::DocumentSnapshot;
use crate::store::value::{MapValue, StoreValue, ValueKind};

use super::DocumentStore;

/// Number of calls served by an [`InMemoryDocumentStore`], split by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub reads: usize,
    pub writes: usize,
    pub queries: usize,
}

impl OperationCounts {
    pub fn total(&self) -> usize {
        self.reads + self.writes + self.queries
    }
}

#[derive(Default)]
struct Counters {
    reads: AtomicUsize,
    writes: AtomicUsize,
    queries: AtomicUsize,
}

/// Process-local document store, used by tests and offline demos.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<BTreeMap<DocumentKey, MapValue>>>,
    counters: Arc<Counters>,
    max_batch_size: usize,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self {
            documents: Arc::default(),
            counters: Arc::default(),
            max_batch_size: MAX_IN_FILTER_SIZE,
        }
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Seeds or replaces a document without touching the operation counters.
    pub fn insert_document(&self, key: DocumentKey, data: MapValue) {
        if let Ok(mut store) = self.lock() {
            store.insert(key, data);
        }
    }

    pub fn remove_document(&self, key: &DocumentKey) {
        if let Ok(mut store) = self.lock() {
            store.remove(key);
        }
    }

    /// Current contents of a document, bypassing the operation counters.
    pub fn document(&self, key: &DocumentKey) -> Option<MapValue> {
        self.lock().ok().and_then(|store| store.get(key).cloned())
    }

    pub fn operation_counts(&self) -> OperationCounts {
        OperationCounts {
            reads: self.counters.reads.load(Ordering::SeqCst),
            writes: self.counters.writes.load(Ordering::SeqCst),
            queries: self.counters.queries.load(Ordering::SeqCst),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, BTreeMap<DocumentKey, MapValue>>> {
        self.documents
            .lock()
            .map_err(|_| internal_error("in-memory document store lock poisoned"))
    }

    fn mutate_field<F>(&self, key: &DocumentKey, field: &str, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(Option<&mut StoreValue>) -> Option<StoreValue>,
    {
        self.counters.writes.fetch_add(1, Ordering::SeqCst);
        let mut store = self.lock()?;
        let document = store
            .get_mut(key)
            .ok_or_else(|| not_found(format!("Document {key} does not exist")))?;
        let fields = document.fields_mut();
        if let Some(replacement) = mutate(fields.get_mut(field)) {
            fields.insert(field.to_string(), replacement);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        let store = self.lock()?;
        Ok(DocumentSnapshot::new(key.clone(), store.get(key).cloned()))
    }

    async fn set_field(&self, key: &DocumentKey, field: &str, value: StoreValue) -> StoreResult<()> {
        self.mutate_field(key, field, |_| Some(value))
    }

    async fn add_to_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()> {
        self.mutate_field(key, field, |current| match current.map(StoreValue::kind_mut) {
            Some(ValueKind::Array(array)) => {
                array.union_with(value);
                None
            }
            _ => Some(StoreValue::from_array(vec![value])),
        })
    }

    async fn remove_from_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()> {
        self.mutate_field(key, field, |current| match current.map(StoreValue::kind_mut) {
            Some(ValueKind::Array(array)) => {
                array.remove_all(&value);
                None
            }
            _ => Some(StoreValue::from_array(Vec::new())),
        })
    }

    async fn query_by_ids_in(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        if ids.is_empty() {
            return Err(invalid_argument("'in' filters require a non-empty list of ids"));
        }
        if ids.len() > self.max_batch_size {
            return Err(invalid_argument(format!(
                "'in' filters support at most {} elements, got {}",
                self.max_batch_size,
                ids.len()
            )));
        }

        let store = self.lock()?;
        let mut documents = Vec::new();
        for id in ids {
            let key = DocumentKey::new(collection, id.as_str())?;
            if let Some(data) = store.get(&key) {
                if !documents.iter().any(|doc: &DocumentSnapshot| doc.key() == &key) {
                    documents.push(DocumentSnapshot::new(key, Some(data.clone())));
                }
            }
        }
        documents.sort_by(|left, right| left.key().cmp(right.key()));
        Ok(documents)
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        let store = self.lock()?;
        Ok(store
            .iter()
            .filter(|(key, _)| key.collection() == collection)
            .filter(|(_, data)| {
                data.get(field)
                    .and_then(StoreValue::as_array)
                    .map(|array| array.contains(&value))
                    .unwrap_or(false)
            })
            .map(|(key, data)| DocumentSnapshot::new(key.clone(), Some(data.clone())))
            .collect())
    }

    async fn toggle_set_membership(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<bool> {
        let mut member = false;
        self.mutate_field(key, field, |current| match current.map(StoreValue::kind_mut) {
            Some(ValueKind::Array(array)) => {
                if array.contains(&value) {
                    array.remove_all(&value);
                } else {
                    array.union_with(value);
                    member = true;
                }
                None
            }
            _ => {
                member = true;
                Some(StoreValue::from_array(vec![value]))
            }
        })?;
        Ok(member)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str) -> DocumentKey {
        DocumentKey::new("locations", id).unwrap()
    }

    fn seeded(store: &InMemoryDocumentStore, id: &str, likes: Option<StoreValue>) {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), StoreValue::from_string(id));
        if let Some(likes) = likes {
            fields.insert("likes".to_string(), likes);
        }
        store.insert_document(location(id), MapValue::new(fields));
    }

    #[tokio::test]
    async fn in_memory_get_and_set_field() {
        let store = InMemoryDocumentStore::new();
        seeded(&store, "loc1", None);
        store
            .set_field(&location("loc1"), "likes", StoreValue::from_array(Vec::new()))
            .await
            .unwrap();
        let snapshot = store.get_document(&location("loc1")).await.unwrap();
        assert!(snapshot.exists());
        assert_eq!(
            snapshot.get("likes"),
            Some(&StoreValue::from_array(Vec::new()))
        );
        assert_eq!(snapshot.get("name"), Some(&StoreValue::from_string("loc1")));
        assert_eq!(store.operation_counts(), OperationCounts { reads: 1, writes: 1, queries: 0 });
    }

    #[tokio::test]
    async fn field_writes_require_existing_document() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .add_to_set_field(&location("ghost"), "likes", StoreValue::from_string("u1"))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "store/not-found");
        assert!(store.document(&location("ghost")).is_none());
    }

    #[tokio::test]
    async fn set_transforms_follow_array_semantics() {
        let store = InMemoryDocumentStore::new();
        seeded(&store, "loc1", Some(StoreValue::from_string("garbage")));
        let key = location("loc1");

        store
            .add_to_set_field(&key, "likes", StoreValue::from_string("u1"))
            .await
            .unwrap();
        store
            .add_to_set_field(&key, "likes", StoreValue::from_string("u1"))
            .await
            .unwrap();
        assert_eq!(
            store.document(&key).unwrap().get("likes"),
            Some(&StoreValue::string_array(["u1"]))
        );

        store
            .remove_from_set_field(&key, "likes", StoreValue::from_string("u1"))
            .await
            .unwrap();
        assert_eq!(
            store.document(&key).unwrap().get("likes"),
            Some(&StoreValue::from_array(Vec::new()))
        );

        seeded(&store, "loc2", Some(StoreValue::from_integer(4)));
        store
            .remove_from_set_field(&location("loc2"), "likes", StoreValue::from_string("u1"))
            .await
            .unwrap();
        assert_eq!(
            store.document(&location("loc2")).unwrap().get("likes"),
            Some(&StoreValue::from_array(Vec::new()))
        );
    }

    #[tokio::test]
    async fn query_by_ids_omits_missing_and_enforces_ceiling() {
        let store = InMemoryDocumentStore::new().with_max_batch_size(2);
        seeded(&store, "a", None);
        seeded(&store, "b", None);

        let ids = vec!["b".to_string(), "missing".to_string()];
        let snapshots = store.query_by_ids_in("locations", &ids).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].id(), "b");

        let too_many = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = store.query_by_ids_in("locations", &too_many).await.unwrap_err();
        assert_eq!(err.code_str(), "store/invalid-argument");
        assert_eq!(store.operation_counts().queries, 2);
    }

    #[tokio::test]
    async fn array_contains_matches_members_only() {
        let store = InMemoryDocumentStore::new();
        seeded(&store, "a", Some(StoreValue::string_array(["u1", "u2"])));
        seeded(&store, "b", Some(StoreValue::string_array(["u2"])));
        seeded(&store, "c", Some(StoreValue::from_string("u1")));

        let snapshots = store
            .query_array_contains("locations", "likes", StoreValue::from_string("u1"))
            .await
            .unwrap();
        let ids: Vec<_> = snapshots.iter().map(|snap| snap.id().to_string()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let store = InMemoryDocumentStore::new();
        seeded(&store, "a", None);
        let key = location("a");
        let value = StoreValue::from_string("u1");
        assert!(store.toggle_set_membership(&key, "likes", value.clone()).await.unwrap());
        assert!(!store.toggle_set_membership(&key, "likes", value.clone()).await.unwrap());
        assert_eq!(
            store.document(&key).unwrap().get("likes"),
            Some(&StoreValue::from_array(Vec::new()))
        );
    }
}
