use std::sync::Arc;

use async_trait::async_trait;

use crate::store::constants::MAX_IN_FILTER_SIZE;
use crate::store::error::{unimplemented, StoreResult};
use crate::store::model::DocumentKey;
use crate::store::snapshot::DocumentSnapshot;
use crate::store::value::StoreValue;

pub mod http;
pub mod in_memory;

/// Remote document store consumed by the like and location services.
///
/// Field writes address a single top-level field of an existing document and must
/// never create the document or overwrite sibling fields. Set writes follow array
/// transform semantics: adding to a missing or non-array field replaces it with a
/// one-element array, removing from one replaces it with an empty array.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get_document(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot>;

    /// Overwrites `field` with `value`.
    async fn set_field(&self, key: &DocumentKey, field: &str, value: StoreValue) -> StoreResult<()>;

    /// Idempotent set-union of `value` into the array stored at `field`.
    async fn add_to_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()>;

    /// Idempotent removal of every `value` element from the array stored at `field`.
    async fn remove_from_set_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<()>;

    /// Fetches the documents of `collection` whose ids are listed in `ids`.
    ///
    /// At most [`max_batch_size`](Self::max_batch_size) ids are accepted per call. Ids with
    /// no backing document are omitted from the result.
    async fn query_by_ids_in(
        &self,
        collection: &str,
        ids: &[String],
    ) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Fetches the documents of `collection` whose array `field` contains `value`.
    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Atomically adds `value` to the array at `field` when absent and removes it when
    /// present, returning whether it is a member afterwards.
    async fn toggle_set_membership(
        &self,
        key: &DocumentKey,
        field: &str,
        value: StoreValue,
    ) -> StoreResult<bool> {
        let _ = (field, value);
        Err(unimplemented(format!(
            "atomic membership toggle is not supported for {key}"
        )))
    }

    fn max_batch_size(&self) -> usize {
        MAX_IN_FILTER_SIZE
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    async fn get_token(&self) -> StoreResult<Option<String>>;
    fn invalidate_token(&self);
}

#[derive(Default, Clone)]
pub struct NoopTokenProvider;

#[async_trait]
impl TokenProvider for NoopTokenProvider {
    async fn get_token(&self) -> StoreResult<Option<String>> {
        Ok(None)
    }

    fn invalidate_token(&self) {}
}

pub type TokenProviderArc = Arc<dyn TokenProvider>;

pub use http::{HttpDocumentStore, HttpDocumentStoreBuilder, RetrySettings};
pub use in_memory::{InMemoryDocumentStore, OperationCounts};
