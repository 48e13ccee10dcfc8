use std::sync::Arc;

use crate::favorites::LocalFavoriteStore;
use crate::likes::RemoteLikeStore;
use crate::local::{InMemoryKeyValueStore, KeyValueStore};
use crate::locations::{BatchLocationFetcher, Location};
use crate::store::{DocumentStore, InMemoryDocumentStore};

use super::settings::InterestSettings;

/// Likes and favorites of locations for a signed-in user.
///
/// Likes live in the shared remote document of each location and are visible to every
/// user. Favorites are bookmarks kept on the device. No operation returns an error:
/// failures are logged and reported as `false`, `0` or an empty list.
///
/// Cloning is cheap; clones share the same stores.
#[derive(Clone)]
pub struct LocationInterestService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    settings: InterestSettings,
    likes: RemoteLikeStore,
    favorites: LocalFavoriteStore,
    fetcher: BatchLocationFetcher,
}

impl LocationInterestService {
    pub fn new(remote: Arc<dyn DocumentStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self::with_settings(remote, local, InterestSettings::default())
    }

    pub fn with_settings(
        remote: Arc<dyn DocumentStore>,
        local: Arc<dyn KeyValueStore>,
        settings: InterestSettings,
    ) -> Self {
        let likes = RemoteLikeStore::new(
            Arc::clone(&remote),
            settings.locations_collection(),
            settings.likes_field(),
        )
        .with_toggle_mode(settings.toggle_mode());
        let favorites = LocalFavoriteStore::with_key_prefix(local, settings.favorites_key_prefix());
        let mut fetcher = BatchLocationFetcher::new(
            remote,
            settings.locations_collection(),
            settings.likes_field(),
        );
        if let Some(max_batch_size) = settings.max_batch_size() {
            fetcher = fetcher.with_max_batch_size(max_batch_size);
        }

        Self {
            inner: Arc::new(ServiceInner {
                settings,
                likes,
                favorites,
                fetcher,
            }),
        }
    }

    /// Service backed by fresh in-memory stores, for tests and offline previews.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryKeyValueStore::new()),
        )
    }

    pub fn settings(&self) -> &InterestSettings {
        &self.inner.settings
    }

    pub async fn is_liked(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.likes.is_liked(user_id, location_id).await
    }

    pub async fn like_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.likes.like(user_id, location_id).await
    }

    pub async fn unlike_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.likes.unlike(user_id, location_id).await
    }

    /// Returns whether the user likes the location after the toggle.
    pub async fn toggle_like_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.likes.toggle_like(user_id, location_id).await
    }

    pub async fn get_likes_count(&self, location_id: &str) -> usize {
        self.inner.likes.count_likes(location_id).await
    }

    /// Locations whose likes contain `user_id`.
    pub async fn get_liked_locations(&self, user_id: &str) -> Vec<Location> {
        let likes_field = self.inner.settings.likes_field();
        self.inner
            .likes
            .liked_by(user_id)
            .await
            .into_iter()
            .filter_map(|snapshot| Location::from_snapshot(snapshot, likes_field))
            .collect()
    }

    /// Ids the user favorited, in the order they were added.
    pub async fn get_favorite_locations(&self, user_id: &str) -> Vec<String> {
        self.inner.favorites.get_favorites(user_id).await
    }

    /// Favorited locations hydrated from the remote store. Locations deleted remotely are
    /// left out.
    pub async fn get_favorite_location_records(&self, user_id: &str) -> Vec<Location> {
        let ids = self.inner.favorites.get_favorites(user_id).await;
        self.inner.fetcher.fetch_by_ids(&ids).await
    }

    pub async fn is_location_favorited(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.favorites.is_favorited(user_id, location_id).await
    }

    pub async fn favorite_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.favorites.favorite(user_id, location_id).await
    }

    pub async fn unfavorite_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner.favorites.unfavorite(user_id, location_id).await
    }

    /// Returns whether the location is a favorite after the toggle.
    pub async fn toggle_favorite_location(&self, user_id: &str, location_id: &str) -> bool {
        self.inner
            .favorites
            .toggle_favorite(user_id, location_id)
            .await
    }

    /// Forgets every favorite of `user_id`, e.g. on sign-out or account deletion.
    pub async fn clear_user_favorite_locations(&self, user_id: &str) {
        self.inner.favorites.clear(user_id).await
    }

    pub async fn fetch_by_ids(&self, ids: &[String]) -> Vec<Location> {
        self.inner.fetcher.fetch_by_ids(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likes::ToggleMode;
    use crate::store::{DocumentKey, MapValue, StoreValue};
    use crate::test_support::fakes::{FailingDocumentStore, FailingKeyValueStore};

    fn seed(remote: &InMemoryDocumentStore, collection: &str, id: &str, likes: &[&str]) {
        remote.insert_document(
            DocumentKey::new(collection, id).unwrap(),
            [
                ("name", StoreValue::from_string(id)),
                ("likes", StoreValue::string_array(likes.iter().copied())),
            ]
            .into_iter()
            .collect::<MapValue>(),
        );
    }

    fn service(remote: &InMemoryDocumentStore, local: &InMemoryKeyValueStore) -> LocationInterestService {
        LocationInterestService::new(Arc::new(remote.clone()), Arc::new(local.clone()))
    }

    #[tokio::test]
    async fn likes_flow_through_remote_store() {
        let remote = InMemoryDocumentStore::new();
        let local = InMemoryKeyValueStore::new();
        seed(&remote, "locations", "locA", &[]);
        let service = service(&remote, &local);

        assert!(service.like_location("u1", "locA").await);
        assert!(service.is_liked("u1", "locA").await);
        assert_eq!(service.get_likes_count("locA").await, 1);
        assert!(!service.toggle_like_location("u1", "locA").await);
        assert!(!service.unlike_location("u1", "locA").await);
        assert_eq!(service.get_likes_count("locA").await, 0);
        assert_eq!(local.operation_count(), 0);
    }

    #[tokio::test]
    async fn favorites_flow_through_local_store() {
        let remote = InMemoryDocumentStore::new();
        let local = InMemoryKeyValueStore::new();
        seed(&remote, "locations", "locA", &[]);
        seed(&remote, "locations", "locB", &[]);
        let service = service(&remote, &local);

        assert!(service.favorite_location("u2", "locA").await);
        assert!(service.toggle_favorite_location("u2", "locB").await);
        assert!(service.favorite_location("u2", "gone").await);
        assert_eq!(remote.operation_counts().total(), 0);

        assert_eq!(service.get_favorite_locations("u2").await, vec!["locA", "locB", "gone"]);
        let records = service.get_favorite_location_records("u2").await;
        let ids: Vec<&str> = records.iter().map(Location::id).collect();
        assert_eq!(ids, vec!["locA", "locB"]);

        assert!(service.unfavorite_location("u2", "gone").await);
        assert!(service.is_location_favorited("u2", "locA").await);
        service.clear_user_favorite_locations("u2").await;
        assert!(service.get_favorite_locations("u2").await.is_empty());
    }

    #[tokio::test]
    async fn liked_locations_are_hydrated() {
        let remote = InMemoryDocumentStore::new();
        seed(&remote, "locations", "locA", &["u1"]);
        seed(&remote, "locations", "locB", &["u2"]);
        let service = service(&remote, &InMemoryKeyValueStore::new());

        let liked = service.get_liked_locations("u1").await;
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id(), "locA");
        assert_eq!(liked[0].name(), Some("locA"));
    }

    #[tokio::test]
    async fn settings_rename_collection_and_slot() {
        let remote = InMemoryDocumentStore::new();
        let local = InMemoryKeyValueStore::new();
        seed(&remote, "sites", "locA", &[]);
        let service = LocationInterestService::with_settings(
            Arc::new(remote.clone()),
            Arc::new(local.clone()),
            InterestSettings::default()
                .with_locations_collection("sites")
                .with_favorites_key_prefix("bookmarks")
                .with_toggle_mode(ToggleMode::Atomic),
        );

        assert!(service.toggle_like_location("u1", "locA").await);
        assert_eq!(service.get_likes_count("locA").await, 1);
        assert!(service.favorite_location("u1", "locA").await);
        assert!(local.raw("bookmarks:u1").is_some());
        assert_eq!(service.fetch_by_ids(&["locA".to_string()]).await.len(), 1);
    }

    #[tokio::test]
    async fn batch_override_lowers_chunk_size() {
        let remote = InMemoryDocumentStore::new();
        for index in 0..6 {
            seed(&remote, "locations", &format!("loc{index}"), &[]);
        }
        let service = LocationInterestService::with_settings(
            Arc::new(remote.clone()),
            Arc::new(InMemoryKeyValueStore::new()),
            InterestSettings::default().with_max_batch_size(2),
        );
        let ids: Vec<String> = (0..6).map(|index| format!("loc{index}")).collect();
        assert_eq!(service.fetch_by_ids(&ids).await.len(), 6);
        assert_eq!(remote.operation_counts().queries, 3);
    }

    #[tokio::test]
    async fn unavailable_backends_yield_safe_defaults() {
        let service = LocationInterestService::new(
            Arc::new(FailingDocumentStore::new()),
            Arc::new(FailingKeyValueStore::new()),
        );

        assert!(!service.is_liked("u1", "locA").await);
        assert!(!service.like_location("u1", "locA").await);
        assert!(!service.toggle_like_location("u1", "locA").await);
        assert_eq!(service.get_likes_count("locA").await, 0);
        assert!(service.get_liked_locations("u1").await.is_empty());
        assert!(service.get_favorite_locations("u1").await.is_empty());
        assert!(service.get_favorite_location_records("u1").await.is_empty());
        assert!(!service.favorite_location("u1", "locA").await);
        assert!(!service.toggle_favorite_location("u1", "locA").await);
        assert!(service.fetch_by_ids(&["locA".to_string()]).await.is_empty());
        service.clear_user_favorite_locations("u1").await;
    }

    #[tokio::test]
    async fn in_memory_service_starts_empty() {
        let service = LocationInterestService::in_memory();
        assert_eq!(service.get_likes_count("locA").await, 0);
        assert!(service.favorite_location("u1", "locA").await);
        assert!(service.fetch_by_ids(&[]).await.is_empty());
        assert_eq!(service.settings(), &InterestSettings::default());
    }
}
