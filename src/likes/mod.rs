//! Shared per-location likes kept in the remote document store.
//!
//! A location's `likes` field is an array of user ids treated as a set. Reads pass the
//! field through [`repair_if_malformed`]; an absent or non-array field is rewritten to
//! an empty array before the operation continues.

mod field;
mod store;

pub use field::{repair_if_malformed, LikesField, NormalizedLikes};
pub use store::{RemoteLikeStore, ToggleMode};
