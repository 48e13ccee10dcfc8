use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::error::{internal_error, LocalStorageResult};
use super::KeyValueStore;

/// Key-value store kept in process memory. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    operations: Arc<AtomicUsize>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read, write and delete calls served so far.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Raw slot contents, bypassing the operation counter.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().ok().and_then(|entries| entries.get(key).cloned())
    }

    /// Writes a raw slot without counting it as an operation.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.lock() {
            entries.insert(key.into(), value.into());
        }
    }

    fn lock(&self) -> LocalStorageResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| internal_error("in-memory key-value store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn read(&self, key: &str) -> LocalStorageResult<Option<String>> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock()?.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> LocalStorageResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> LocalStorageResult<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.lock()?.remove(key);
        Ok(())
    }
}
