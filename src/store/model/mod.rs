mod database_id;
mod document_key;
mod geo_point;

pub use database_id::DatabaseId;
pub use document_key::DocumentKey;
pub use geo_point::GeoPoint;
