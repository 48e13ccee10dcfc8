//! Location records and their batched lookup by id.

mod fetcher;
mod model;

pub use fetcher::BatchLocationFetcher;
pub use model::Location;
