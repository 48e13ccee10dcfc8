use std::sync::Arc;

use crate::error::{invalid_input, recover, require_id, InterestResult};
use crate::store::{DocumentKey, DocumentSnapshot, DocumentStore, StoreErrorCode, StoreValue};

use super::field::{repair_if_malformed, LikesField, NormalizedLikes};

/// How [`RemoteLikeStore::toggle_like`] talks to the document store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToggleMode {
    /// Read membership, then issue the matching add or remove.
    #[default]
    ReadThenWrite,
    /// Ask the store for a single atomic toggle, falling back to
    /// [`ReadThenWrite`](Self::ReadThenWrite) when the store cannot do it.
    Atomic,
}

/// Result of a single like/unlike write step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Change {
    Written,
    Unchanged,
    NoDocument,
}

/// Per-location set of user ids kept in a remote document field.
///
/// Every public operation is total: invalid input and store failures are logged and
/// turned into the operation's safe default (`false` or `0`).
#[derive(Clone)]
pub struct RemoteLikeStore {
    store: Arc<dyn DocumentStore>,
    collection: String,
    field: String,
    toggle_mode: ToggleMode,
}

impl RemoteLikeStore {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            field: field.into(),
            toggle_mode: ToggleMode::default(),
        }
    }

    pub fn with_toggle_mode(mut self, toggle_mode: ToggleMode) -> Self {
        self.toggle_mode = toggle_mode;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn toggle_mode(&self) -> ToggleMode {
        self.toggle_mode
    }

    /// Whether `user_id` is in the location's likes set. Repairs a malformed set.
    pub async fn is_liked(&self, user_id: &str, location_id: &str) -> bool {
        self.try_is_liked(user_id, location_id)
            .await
            .unwrap_or_else(|err| recover("is_liked", err, false))
    }

    /// Adds `user_id` to the likes set; `true` when this call inserted it.
    pub async fn like(&self, user_id: &str, location_id: &str) -> bool {
        match self.try_like(user_id, location_id).await {
            Ok(change) => change == Change::Written,
            Err(err) => recover("like", err, false),
        }
    }

    /// Removes `user_id` from the likes set; `true` when this call removed it.
    pub async fn unlike(&self, user_id: &str, location_id: &str) -> bool {
        match self.try_unlike(user_id, location_id).await {
            Ok(change) => change == Change::Written,
            Err(err) => recover("unlike", err, false),
        }
    }

    /// Flips membership and returns whether the user likes the location afterwards.
    pub async fn toggle_like(&self, user_id: &str, location_id: &str) -> bool {
        self.try_toggle_like(user_id, location_id)
            .await
            .unwrap_or_else(|err| recover("toggle_like", err, false))
    }

    /// Size of the likes set, `0` for missing locations and malformed sets.
    pub async fn count_likes(&self, location_id: &str) -> usize {
        self.try_count_likes(location_id)
            .await
            .unwrap_or_else(|err| recover("count_likes", err, 0))
    }

    /// Location documents whose likes set contains `user_id`.
    pub async fn liked_by(&self, user_id: &str) -> Vec<DocumentSnapshot> {
        self.try_liked_by(user_id)
            .await
            .unwrap_or_else(|err| recover("liked_by", err, Vec::new()))
    }

    fn key(&self, location_id: &str) -> InterestResult<DocumentKey> {
        require_id("location id", location_id)?;
        DocumentKey::new(self.collection.as_str(), location_id)
            .map_err(|err| invalid_input(err.to_string()))
    }

    /// Reads the likes field and passes it through the repair step. `None` when the
    /// location document does not exist.
    async fn load(&self, key: &DocumentKey) -> InterestResult<Option<NormalizedLikes>> {
        let snapshot = self.store.get_document(key).await?;
        let Some(data) = snapshot.data() else {
            log::debug!("location {key} does not exist");
            return Ok(None);
        };
        let field = LikesField::from_document(data, &self.field);
        if let LikesField::Invalid(value) = &field {
            log::debug!(
                "repairing {} on {key}: found {} instead of an array",
                self.field,
                value.type_name()
            );
        }
        Ok(Some(repair_if_malformed(field)))
    }

    async fn overwrite(&self, key: &DocumentKey, members: &[&str]) -> InterestResult<()> {
        self.store
            .set_field(key, &self.field, StoreValue::string_array(members.iter().copied()))
            .await?;
        Ok(())
    }

    async fn try_is_liked(&self, user_id: &str, location_id: &str) -> InterestResult<bool> {
        require_id("user id", user_id)?;
        let key = self.key(location_id)?;
        match self.load(&key).await? {
            None => Ok(false),
            Some(likes) if likes.needs_repair() => {
                self.overwrite(&key, &[]).await?;
                Ok(false)
            }
            Some(likes) => Ok(likes.contains(user_id)),
        }
    }

    async fn try_like(&self, user_id: &str, location_id: &str) -> InterestResult<Change> {
        require_id("user id", user_id)?;
        let key = self.key(location_id)?;
        match self.load(&key).await? {
            None => Ok(Change::NoDocument),
            Some(likes) if likes.needs_repair() => {
                self.overwrite(&key, &[user_id]).await?;
                Ok(Change::Written)
            }
            Some(likes) if likes.contains(user_id) => Ok(Change::Unchanged),
            Some(_) => {
                self.store
                    .add_to_set_field(&key, &self.field, StoreValue::from_string(user_id))
                    .await?;
                Ok(Change::Written)
            }
        }
    }

    async fn try_unlike(&self, user_id: &str, location_id: &str) -> InterestResult<Change> {
        require_id("user id", user_id)?;
        let key = self.key(location_id)?;
        match self.load(&key).await? {
            None => Ok(Change::NoDocument),
            Some(likes) if likes.needs_repair() => {
                self.overwrite(&key, &[]).await?;
                Ok(Change::Unchanged)
            }
            Some(likes) if !likes.contains(user_id) => Ok(Change::Unchanged),
            Some(_) => {
                self.store
                    .remove_from_set_field(&key, &self.field, StoreValue::from_string(user_id))
                    .await?;
                Ok(Change::Written)
            }
        }
    }

    async fn try_toggle_like(&self, user_id: &str, location_id: &str) -> InterestResult<bool> {
        require_id("user id", user_id)?;
        let key = self.key(location_id)?;

        if self.toggle_mode == ToggleMode::Atomic {
            match self
                .store
                .toggle_set_membership(&key, &self.field, StoreValue::from_string(user_id))
                .await
            {
                Ok(member) => return Ok(member),
                Err(err) if err.code == StoreErrorCode::Unimplemented => {
                    log::debug!("atomic toggle unavailable, reading first: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }

        if self.try_is_liked(user_id, location_id).await? {
            self.try_unlike(user_id, location_id).await?;
            Ok(false)
        } else {
            let change = self.try_like(user_id, location_id).await?;
            Ok(change != Change::NoDocument)
        }
    }

    async fn try_count_likes(&self, location_id: &str) -> InterestResult<usize> {
        let key = self.key(location_id)?;
        match self.load(&key).await? {
            None => Ok(0),
            Some(likes) if likes.needs_repair() => {
                self.overwrite(&key, &[]).await?;
                Ok(0)
            }
            Some(likes) => Ok(likes.len()),
        }
    }

    async fn try_liked_by(&self, user_id: &str) -> InterestResult<Vec<DocumentSnapshot>> {
        require_id("user id", user_id)?;
        let documents = self
            .store
            .query_array_contains(&self.collection, &self.field, StoreValue::from_string(user_id))
            .await?;
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryDocumentStore, MapValue, ValueKind};
    use crate::test_support::fakes::FailingDocumentStore;

    fn key(id: &str) -> DocumentKey {
        DocumentKey::new("locations", id).unwrap()
    }

    fn location(store: &InMemoryDocumentStore, id: &str, likes: Option<StoreValue>) {
        let mut fields: Vec<(&str, StoreValue)> = vec![("name", StoreValue::from_string(id))];
        if let Some(likes) = likes {
            fields.push(("likes", likes));
        }
        store.insert_document(key(id), fields.into_iter().collect::<MapValue>());
    }

    fn likes_of(store: &InMemoryDocumentStore, id: &str) -> Option<StoreValue> {
        store
            .document(&key(id))
            .and_then(|data| data.get("likes").cloned())
    }

    fn likes(store: &InMemoryDocumentStore) -> RemoteLikeStore {
        RemoteLikeStore::new(Arc::new(store.clone()), "locations", "likes")
    }

    #[tokio::test]
    async fn like_then_unlike() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::string_array(["u2"])));
        let likes = likes(&backend);

        assert!(likes.like("u1", "locA").await);
        assert!(!likes.like("u1", "locA").await);
        assert!(likes.is_liked("u1", "locA").await);
        assert_eq!(likes.count_likes("locA").await, 2);

        assert!(likes.unlike("u1", "locA").await);
        assert!(!likes.unlike("u1", "locA").await);
        assert!(!likes.is_liked("u1", "locA").await);
        assert_eq!(
            likes_of(&backend, "locA"),
            Some(StoreValue::string_array(["u2"]))
        );
    }

    #[tokio::test]
    async fn malformed_likes_are_repaired_on_read() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::from_string("u1")));
        location(&backend, "locB", None);
        let likes = likes(&backend);

        assert!(!likes.is_liked("u1", "locA").await);
        assert_eq!(likes_of(&backend, "locA"), Some(StoreValue::from_array(Vec::new())));

        assert_eq!(likes.count_likes("locB").await, 0);
        assert_eq!(likes_of(&backend, "locB"), Some(StoreValue::from_array(Vec::new())));
        assert_eq!(
            backend.document(&key("locB")).unwrap().get("name"),
            Some(&StoreValue::from_string("locB"))
        );
    }

    #[tokio::test]
    async fn like_on_malformed_field_writes_single_member() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::from_integer(4)));
        let likes = likes(&backend);

        assert!(likes.like("u1", "locA").await);
        assert_eq!(
            likes_of(&backend, "locA"),
            Some(StoreValue::string_array(["u1"]))
        );
    }

    #[tokio::test]
    async fn missing_location_is_never_created() {
        let backend = InMemoryDocumentStore::new();
        let likes = likes(&backend);

        assert!(!likes.is_liked("u1", "ghost").await);
        assert!(!likes.like("u1", "ghost").await);
        assert!(!likes.unlike("u1", "ghost").await);
        assert!(!likes.toggle_like("u1", "ghost").await);
        assert_eq!(likes.count_likes("ghost").await, 0);
        assert!(backend.document(&key("ghost")).is_none());
        assert_eq!(backend.operation_counts().writes, 0);
    }

    #[tokio::test]
    async fn empty_ids_skip_the_store() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::string_array(["u1"])));
        let likes = likes(&backend);

        assert!(!likes.is_liked("", "locA").await);
        assert!(!likes.like("u1", "").await);
        assert!(!likes.toggle_like("", "").await);
        assert_eq!(likes.count_likes("").await, 0);
        assert!(likes.liked_by("").await.is_empty());
        assert_eq!(backend.operation_counts().total(), 0);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::from_array(Vec::new())));
        let likes = likes(&backend);

        assert!(likes.toggle_like("u1", "locA").await);
        assert!(likes.is_liked("u1", "locA").await);
        assert!(!likes.toggle_like("u1", "locA").await);
        assert!(!likes.is_liked("u1", "locA").await);
    }

    #[tokio::test]
    async fn atomic_toggle_uses_single_store_call() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::from_array(Vec::new())));
        let likes = likes(&backend).with_toggle_mode(ToggleMode::Atomic);

        assert!(likes.toggle_like("u1", "locA").await);
        let counts = backend.operation_counts();
        assert_eq!(counts.reads, 0);
        assert_eq!(counts.writes, 1);
        assert!(!likes.toggle_like("u1", "locA").await);
    }

    #[tokio::test]
    async fn store_failures_fall_back_to_defaults() {
        let likes = RemoteLikeStore::new(Arc::new(FailingDocumentStore::new()), "locations", "likes")
            .with_toggle_mode(ToggleMode::Atomic);

        assert!(!likes.is_liked("u1", "locA").await);
        assert!(!likes.like("u1", "locA").await);
        assert!(!likes.unlike("u1", "locA").await);
        assert!(!likes.toggle_like("u1", "locA").await);
        assert_eq!(likes.count_likes("locA").await, 0);
        assert!(likes.liked_by("u1").await.is_empty());
    }

    #[tokio::test]
    async fn liked_by_lists_matching_documents() {
        let backend = InMemoryDocumentStore::new();
        location(&backend, "locA", Some(StoreValue::string_array(["u1"])));
        location(&backend, "locB", Some(StoreValue::string_array(["u2"])));
        location(&backend, "locC", Some(StoreValue::string_array(["u2", "u1"])));
        let likes = likes(&backend);

        let ids: Vec<String> = likes
            .liked_by("u1")
            .await
            .iter()
            .map(|snapshot| snapshot.id().to_string())
            .collect();
        assert_eq!(ids, vec!["locA".to_string(), "locC".to_string()]);
        assert!(matches!(
            likes_of(&backend, "locA").map(|value| value.kind().clone()),
            Some(ValueKind::Array(_))
        ));
    }
}
