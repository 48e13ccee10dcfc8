use crate::store::model::DocumentKey;
use crate::store::value::{MapValue, StoreValue};

/// Result of reading one document. `data` is `None` when the document does not exist.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    key: DocumentKey,
    data: Option<MapValue>,
}

impl DocumentSnapshot {
    pub fn new(key: DocumentKey, data: Option<MapValue>) -> Self {
        Self { key, data }
    }

    pub fn missing(key: DocumentKey) -> Self {
        Self { key, data: None }
    }

    /// Returns whether the document exists on the backend.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&MapValue> {
        self.data.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.data.as_ref().and_then(|data| data.get(field))
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn into_parts(self) -> (DocumentKey, Option<MapValue>) {
        (self.key, self.data)
    }
}
