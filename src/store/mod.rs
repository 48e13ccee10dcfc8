//! Remote document store used to persist locations and their shared `likes` sets.
//!
//! The [`DocumentStore`] trait is the seam between the like/location services and a
//! concrete backend. Two implementations ship with the crate: an in-memory store for
//! tests and offline use, and an HTTP store speaking the Firestore REST API.

mod constants;
pub mod error;
pub mod model;
pub mod remote;
mod snapshot;
pub mod value;

pub use constants::MAX_IN_FILTER_SIZE;
pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use model::{DatabaseId, DocumentKey, GeoPoint};
pub use remote::{
    DocumentStore, HttpDocumentStore, InMemoryDocumentStore, OperationCounts, RetrySettings,
    TokenProvider, TokenProviderArc,
};
pub use snapshot::DocumentSnapshot;
pub use value::{ArrayValue, MapValue, StoreValue, ValueKind};
