//! Per-user favorite locations persisted on the device.

mod store;

pub use store::{LocalFavoriteStore, DEFAULT_FAVORITES_KEY_PREFIX};
