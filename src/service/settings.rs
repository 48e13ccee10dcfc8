//! Configuration of the like/favorite service.

use crate::favorites::DEFAULT_FAVORITES_KEY_PREFIX;
use crate::likes::ToggleMode;

/// Collection holding location documents.
pub const DEFAULT_LOCATIONS_COLLECTION: &str = "locations";
/// Array field of a location document listing the user ids that like it.
pub const DEFAULT_LIKES_FIELD: &str = "likes";

/// Names and limits used by [`LocationInterestService`](super::LocationInterestService).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterestSettings {
    locations_collection: String,
    likes_field: String,
    favorites_key_prefix: String,
    max_batch_size: Option<usize>,
    toggle_mode: ToggleMode,
}

impl InterestSettings {
    pub fn with_locations_collection(mut self, collection: impl Into<String>) -> Self {
        self.locations_collection = collection.into();
        self
    }

    pub fn with_likes_field(mut self, field: impl Into<String>) -> Self {
        self.likes_field = field.into();
        self
    }

    pub fn with_favorites_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.favorites_key_prefix = prefix.into();
        self
    }

    /// Lowers the number of ids per batch query. The store's own ceiling still applies.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    pub fn with_toggle_mode(mut self, toggle_mode: ToggleMode) -> Self {
        self.toggle_mode = toggle_mode;
        self
    }

    pub fn locations_collection(&self) -> &str {
        &self.locations_collection
    }

    pub fn likes_field(&self) -> &str {
        &self.likes_field
    }

    pub fn favorites_key_prefix(&self) -> &str {
        &self.favorites_key_prefix
    }

    pub fn max_batch_size(&self) -> Option<usize> {
        self.max_batch_size
    }

    pub fn toggle_mode(&self) -> ToggleMode {
        self.toggle_mode
    }
}

impl Default for InterestSettings {
    fn default() -> Self {
        Self {
            locations_collection: DEFAULT_LOCATIONS_COLLECTION.to_string(),
            likes_field: DEFAULT_LIKES_FIELD.to_string(),
            favorites_key_prefix: DEFAULT_FAVORITES_KEY_PREFIX.to_string(),
            max_batch_size: None,
            toggle_mode: ToggleMode::ReadThenWrite,
        }
    }
}
