use std::fmt::{Display, Formatter};

use crate::store::error::{invalid_argument, StoreResult};

/// Address of a single document: a top-level collection and a document id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    collection: String,
    id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> StoreResult<Self> {
        let collection = collection.into();
        let id = id.into();
        validate_segment("collection", &collection)?;
        validate_segment("document id", &id)?;
        Ok(Self { collection, id })
    }

    pub fn from_string(path: &str) -> StoreResult<Self> {
        let mut segments = path.trim_matches('/').split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(collection), Some(id), None) => Self::new(collection, id),
            _ => Err(invalid_argument(format!(
                "Document keys must have the form 'collection/id', got '{path}'"
            ))),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canonical_string(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

fn validate_segment(label: &str, segment: &str) -> StoreResult<()> {
    if segment.is_empty() {
        return Err(invalid_argument(format!("{label} must not be empty")));
    }
    if segment.contains('/') {
        return Err(invalid_argument(format!(
            "{label} '{segment}' must not contain '/'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_path() {
        let key = DocumentKey::from_string("locations/loc1").unwrap();
        assert_eq!(key.collection(), "locations");
        assert_eq!(key.id(), "loc1");
        assert_eq!(key.canonical_string(), "locations/loc1");
    }

    #[test]
    fn rejects_collection_only() {
        let err = DocumentKey::from_string("locations").unwrap_err();
        assert_eq!(err.code_str(), "store/invalid-argument");
    }

    #[test]
    fn rejects_nested_paths() {
        assert!(DocumentKey::from_string("locations/loc1/photos/p1").is_err());
        assert!(DocumentKey::new("locations", "a/b").is_err());
    }

    #[test]
    fn rejects_empty_id() {
        assert!(DocumentKey::new("locations", "").is_err());
    }
}
