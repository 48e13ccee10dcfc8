use std::collections::BTreeSet;

use crate::store::{MapValue, StoreValue, ValueKind};

/// Shape of a location's `likes` attribute as found in the remote document.
#[derive(Clone, Debug, PartialEq)]
pub enum LikesField {
    Absent,
    /// Well-formed array, normalised to the set of user ids it contains.
    Array(BTreeSet<String>),
    /// Present but not an array.
    Invalid(StoreValue),
}

impl LikesField {
    pub fn from_value(value: Option<&StoreValue>) -> Self {
        let Some(value) = value else {
            return LikesField::Absent;
        };
        match value.kind() {
            ValueKind::Array(array) => LikesField::Array(
                array
                    .values()
                    .iter()
                    .filter_map(StoreValue::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => LikesField::Invalid(value.clone()),
        }
    }

    pub fn from_document(data: &MapValue, field: &str) -> Self {
        Self::from_value(data.get(field))
    }

    pub fn is_malformed(&self) -> bool {
        !matches!(self, LikesField::Array(_))
    }
}

/// A `likes` set after the repair step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedLikes {
    likes: BTreeSet<String>,
    needs_repair: bool,
}

impl NormalizedLikes {
    /// Whether the stored field must be rewritten to an empty array.
    pub fn needs_repair(&self) -> bool {
        self.needs_repair
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.likes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.likes.is_empty()
    }

    pub fn into_set(self) -> BTreeSet<String> {
        self.likes
    }
}

/// Maps any `likes` shape onto a set: absent and non-array values become the empty set
/// and are flagged for rewriting, arrays pass through unchanged.
pub fn repair_if_malformed(field: LikesField) -> NormalizedLikes {
    match field {
        LikesField::Array(likes) => NormalizedLikes {
            likes,
            needs_repair: false,
        },
        LikesField::Absent | LikesField::Invalid(_) => NormalizedLikes {
            likes: BTreeSet::new(),
            needs_repair: true,
        },
    }
}
