//! Like and favorite synchronization for field-guide locations.
//!
//! Two independent relations connect users to locations:
//!
//! - **likes**, shared by every user and stored as an array of user ids inside each
//!   location document of a remote [`DocumentStore`](store::DocumentStore);
//! - **favorites**, private bookmarks stored per user in a device-local
//!   [`KeyValueStore`](local::KeyValueStore).
//!
//! [`LocationInterestService`] is the entry point. It never surfaces errors: failures are
//! logged through the [`log`] facade and reported as `false`, `0` or an empty list.
//!
//! ```
//! use fieldguide_likes::LocationInterestService;
//!
//! # async fn demo() {
//! let service = LocationInterestService::in_memory();
//! service.favorite_location("u1", "meadow").await;
//! assert_eq!(service.get_favorite_locations("u1").await, vec!["meadow"]);
//! # }
//! ```

pub mod error;
pub mod favorites;
pub mod likes;
pub mod local;
pub mod locations;
pub mod service;
pub mod store;

pub use error::{InterestError, InterestErrorCode, InterestResult};
pub use favorites::LocalFavoriteStore;
pub use likes::{RemoteLikeStore, ToggleMode};
pub use locations::{BatchLocationFetcher, Location};
pub use service::{InterestSettings, LocationInterestService};

#[cfg(test)]
pub mod test_support;
