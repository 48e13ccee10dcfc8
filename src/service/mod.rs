//! Public like/favorite surface composed from the remote like store, the local favorite
//! store and the batch location fetcher.

mod api;
mod settings;

pub use api::LocationInterestService;
pub use settings::{InterestSettings, DEFAULT_LIKES_FIELD, DEFAULT_LOCATIONS_COLLECTION};
