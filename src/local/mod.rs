//! Device-local key-value persistence.
//!
//! Values are opaque strings; callers own the encoding. Implementations must treat
//! deleting an absent key as success.

use async_trait::async_trait;

pub mod error;
mod file;
mod memory;

pub use error::{LocalStorageError, LocalStorageErrorCode, LocalStorageResult};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn read(&self, key: &str) -> LocalStorageResult<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> LocalStorageResult<()>;
    async fn delete(&self, key: &str) -> LocalStorageResult<()>;
}
