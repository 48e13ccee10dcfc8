use std::collections::BTreeSet;

use crate::likes::{repair_if_malformed, LikesField};
use crate::store::{DocumentSnapshot, GeoPoint, MapValue, StoreValue, ValueKind};

const COORDINATES_FIELD: &str = "coordinates";
const LATITUDE_FIELD: &str = "latitude";
const LONGITUDE_FIELD: &str = "longitude";
const NAME_FIELD: &str = "name";
const DESCRIPTION_FIELD: &str = "description";
const CATEGORY_FIELD: &str = "category";

/// A location document hydrated for display.
///
/// Only the fields this crate interprets are lifted out; everything else stays
/// available through [`fields`](Self::fields).
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    id: String,
    coordinates: Option<GeoPoint>,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    likes: BTreeSet<String>,
    fields: MapValue,
}

impl Location {
    /// Builds a record from an existing document, `None` when the snapshot is missing.
    ///
    /// A malformed likes field hydrates as an empty set; repairs are left to the like store.
    pub fn from_snapshot(snapshot: DocumentSnapshot, likes_field: &str) -> Option<Self> {
        let (key, data) = snapshot.into_parts();
        let fields = data?;
        let likes = repair_if_malformed(LikesField::from_document(&fields, likes_field)).into_set();
        Some(Self {
            id: key.id().to_string(),
            coordinates: coordinates(&fields),
            name: string_field(&fields, NAME_FIELD),
            description: string_field(&fields, DESCRIPTION_FIELD),
            category: category(&fields),
            likes,
            fields,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.coordinates
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Category id, taken from a string field or the last segment of a reference.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn likes(&self) -> &BTreeSet<String> {
        &self.likes
    }

    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn fields(&self) -> &MapValue {
        &self.fields
    }
}

fn string_field(fields: &MapValue, name: &str) -> Option<String> {
    fields.get(name).and_then(StoreValue::as_str).map(str::to_string)
}

fn coordinates(fields: &MapValue) -> Option<GeoPoint> {
    if let Some(ValueKind::GeoPoint(point)) = fields.get(COORDINATES_FIELD).map(StoreValue::kind) {
        return Some(*point);
    }
    let latitude = fields.get(LATITUDE_FIELD).and_then(StoreValue::as_f64)?;
    let longitude = fields.get(LONGITUDE_FIELD).and_then(StoreValue::as_f64)?;
    match GeoPoint::new(latitude, longitude) {
        Ok(point) => Some(point),
        Err(err) => {
            log::debug!("ignoring location coordinates: {err}");
            None
        }
    }
}

fn category(fields: &MapValue) -> Option<String> {
    match fields.get(CATEGORY_FIELD).map(StoreValue::kind) {
        Some(ValueKind::String(value)) => Some(value.clone()),
        Some(ValueKind::Reference(path)) => path.rsplit('/').next().map(str::to_string),
        _ => None,
    }
}
