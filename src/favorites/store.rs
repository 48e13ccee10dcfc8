use std::sync::Arc;

use crate::error::{malformed_state, recover, require_id, InterestResult};
use crate::local::KeyValueStore;

pub const DEFAULT_FAVORITES_KEY_PREFIX: &str = "favorites";

/// Ordered, duplicate-free list of location ids a user bookmarked, stored as a JSON
/// array in the local slot `{prefix}:{user_id}`.
///
/// Local failures are logged; reads then yield an empty list and writes report `false`.
#[derive(Clone)]
pub struct LocalFavoriteStore {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
}

impl LocalFavoriteStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key_prefix(store, DEFAULT_FAVORITES_KEY_PREFIX)
    }

    pub fn with_key_prefix(store: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Local slot holding `user_id`'s favorites.
    pub fn slot_key(&self, user_id: &str) -> String {
        format!("{}:{}", self.key_prefix, user_id)
    }

    pub async fn get_favorites(&self, user_id: &str) -> Vec<String> {
        self.try_get_favorites(user_id)
            .await
            .unwrap_or_else(|err| recover("get_favorites", err, Vec::new()))
    }

    pub async fn is_favorited(&self, user_id: &str, location_id: &str) -> bool {
        if let Err(err) = require_id("location id", location_id) {
            return recover("is_favorited", err, false);
        }
        self.get_favorites(user_id)
            .await
            .iter()
            .any(|id| id == location_id)
    }

    /// Appends `location_id`; `false` when it was already present.
    pub async fn favorite(&self, user_id: &str, location_id: &str) -> bool {
        self.try_favorite(user_id, location_id)
            .await
            .unwrap_or_else(|err| recover("favorite", err, false))
    }

    /// Removes `location_id`; `false` when it was not present.
    pub async fn unfavorite(&self, user_id: &str, location_id: &str) -> bool {
        self.try_unfavorite(user_id, location_id)
            .await
            .unwrap_or_else(|err| recover("unfavorite", err, false))
    }

    /// Flips membership and returns whether the location is a favorite afterwards.
    pub async fn toggle_favorite(&self, user_id: &str, location_id: &str) -> bool {
        self.try_toggle_favorite(user_id, location_id)
            .await
            .unwrap_or_else(|err| recover("toggle_favorite", err, false))
    }

    /// Deletes the user's slot.
    pub async fn clear(&self, user_id: &str) {
        if let Err(err) = self.try_clear(user_id).await {
            recover("clear", err, ());
        }
    }

    async fn try_get_favorites(&self, user_id: &str) -> InterestResult<Vec<String>> {
        require_id("user id", user_id)?;
        self.read(user_id).await
    }

    /// Reads and decodes the slot. Content that is not a list of strings reads as empty.
    async fn read(&self, user_id: &str) -> InterestResult<Vec<String>> {
        let Some(raw) = self.store.read(&self.slot_key(user_id)).await? else {
            return Ok(Vec::new());
        };
        match decode(&raw) {
            Ok(favorites) => Ok(favorites),
            Err(err) => Ok(recover("read favorites", err, Vec::new())),
        }
    }

    async fn write(&self, user_id: &str, favorites: &[String]) -> InterestResult<()> {
        let encoded = serde_json::to_string(favorites)
            .map_err(|err| malformed_state(format!("failed to encode favorites: {err}")))?;
        self.store.write(&self.slot_key(user_id), &encoded).await?;
        Ok(())
    }

    async fn try_favorite(&self, user_id: &str, location_id: &str) -> InterestResult<bool> {
        require_id("user id", user_id)?;
        require_id("location id", location_id)?;
        let mut favorites = self.read(user_id).await?;
        if favorites.iter().any(|id| id == location_id) {
            return Ok(false);
        }
        favorites.push(location_id.to_string());
        self.write(user_id, &favorites).await?;
        Ok(true)
    }

    async fn try_unfavorite(&self, user_id: &str, location_id: &str) -> InterestResult<bool> {
        require_id("user id", user_id)?;
        require_id("location id", location_id)?;
        let mut favorites = self.read(user_id).await?;
        let before = favorites.len();
        favorites.retain(|id| id != location_id);
        if favorites.len() == before {
            return Ok(false);
        }
        self.write(user_id, &favorites).await?;
        Ok(true)
    }

    async fn try_toggle_favorite(&self, user_id: &str, location_id: &str) -> InterestResult<bool> {
        require_id("user id", user_id)?;
        require_id("location id", location_id)?;
        let favorited = self
            .read(user_id)
            .await?
            .iter()
            .any(|id| id == location_id);
        if favorited {
            self.try_unfavorite(user_id, location_id).await?;
            Ok(false)
        } else {
            self.try_favorite(user_id, location_id).await?;
            Ok(true)
        }
    }

    async fn try_clear(&self, user_id: &str) -> InterestResult<()> {
        require_id("user id", user_id)?;
        self.store.delete(&self.slot_key(user_id)).await?;
        Ok(())
    }
}

fn decode(raw: &str) -> InterestResult<Vec<String>> {
    let decoded: Vec<String> = serde_json::from_str(raw)
        .map_err(|err| malformed_state(format!("favorites slot is not a list of ids: {err}")))?;
    let mut favorites: Vec<String> = Vec::with_capacity(decoded.len());
    for id in decoded {
        if !id.is_empty() && !favorites.contains(&id) {
            favorites.push(id);
        }
    }
    Ok(favorites)
}
