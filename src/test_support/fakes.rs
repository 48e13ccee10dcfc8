use async_trait::async_trait;

use crate::local::error::io_error;
use crate::local::{KeyValueStore, LocalStorageResult};
use crate::store::error::unavailable;
use crate::store::{DocumentKey, DocumentSnapshot, DocumentStore, StoreResult, StoreValue};

/// Document store whose every call fails with `store/unavailable`.
#[derive(Clone, Debug, Default)]
pub struct FailingDocumentStore;

impl FailingDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for FailingDocumentStore {
    async fn get_document(&self, key: &DocumentKey) -> StoreResult<DocumentSnapshot> {
        Err(unavailable(format!("get {key}: backend offline")))
    }

    async fn set_field(&self, key: &DocumentKey, _field: &str, _value: StoreValue) -> StoreResult<()> {
        Err(unavailable(format!("set {key}: backend offline")))
    }

    async fn add_to_set_field(
        &self,
        key: &DocumentKey,
        _field: &str,
        _value: StoreValue,
    ) -> StoreResult<()> {
        Err(unavailable(format!("add {key}: backend offline")))
    }

    async fn remove_from_set_field(
        &self,
        key: &DocumentKey,
        _field: &str,
        _value: StoreValue,
    ) -> StoreResult<()> {
        Err(unavailable(format!("remove {key}: backend offline")))
    }

    async fn query_by_ids_in(
        &self,
        collection: &str,
        _ids: &[String],
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        Err(unavailable(format!("query {collection}: backend offline")))
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        _field: &str,
        _value: StoreValue,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        Err(unavailable(format!("query {collection}: backend offline")))
    }

    async fn toggle_set_membership(
        &self,
        key: &DocumentKey,
        _field: &str,
        _value: StoreValue,
    ) -> StoreResult<bool> {
        Err(unavailable(format!("toggle {key}: backend offline")))
    }
}

/// Key-value store whose every call fails with `local-storage/io`.
#[derive(Clone, Debug, Default)]
pub struct FailingKeyValueStore;

impl FailingKeyValueStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn read(&self, key: &str) -> LocalStorageResult<Option<String>> {
        Err(io_error(format!("read {key}: disk unavailable")))
    }

    async fn write(&self, key: &str, _value: &str) -> LocalStorageResult<()> {
        Err(io_error(format!("write {key}: disk unavailable")))
    }

    async fn delete(&self, key: &str) -> LocalStorageResult<()> {
        Err(io_error(format!("delete {key}: disk unavailable")))
    }
}
