use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::store::model::GeoPoint;
use crate::store::value::{ArrayValue, MapValue};

/// A single typed field value of a remote document.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Reference(String),
    GeoPoint(GeoPoint),
    Array(ArrayValue),
    Map(MapValue),
}

impl StoreValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_timestamp(value: DateTime<Utc>) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_geo_point(value: GeoPoint) -> Self {
        Self {
            kind: ValueKind::GeoPoint(value),
        }
    }

    pub fn from_array(values: Vec<StoreValue>) -> Self {
        Self {
            kind: ValueKind::Array(ArrayValue::new(values)),
        }
    }

    /// Builds an array of string values, the shape used for `likes` fields.
    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_array(values.into_iter().map(Self::from_string).collect())
    }

    pub fn from_map(map: BTreeMap<String, StoreValue>) -> Self {
        Self {
            kind: ValueKind::Map(MapValue::new(map)),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ValueKind {
        &mut self.kind
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.kind {
            ValueKind::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Numeric view over integer and double values.
    pub fn as_f64(&self) -> Option<f64> {
        match &self.kind {
            ValueKind::Integer(value) => Some(*value as f64),
            ValueKind::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Short name of the value type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Null => "null",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::Integer(_) => "integer",
            ValueKind::Double(_) => "double",
            ValueKind::Timestamp(_) => "timestamp",
            ValueKind::String(_) => "string",
            ValueKind::Reference(_) => "reference",
            ValueKind::GeoPoint(_) => "geo-point",
            ValueKind::Array(_) => "array",
            ValueKind::Map(_) => "map",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_values() {
        let v = StoreValue::from_string("hello");
        match v.kind() {
            ValueKind::String(value) => assert_eq!(value, "hello"),
            _ => panic!("unexpected kind"),
        }
        assert_eq!(v.as_str(), Some("hello"));
        assert!(v.as_array().is_none());
    }

    #[test]
    fn string_array_preserves_order() {
        let v = StoreValue::string_array(["u1", "u2"]);
        let array = v.as_array().unwrap();
        assert_eq!(array.values()[0].as_str(), Some("u1"));
        assert_eq!(array.values()[1].as_str(), Some("u2"));
    }

    #[test]
    fn numeric_view() {
        assert_eq!(StoreValue::from_integer(3).as_f64(), Some(3.0));
        assert_eq!(StoreValue::from_double(1.5).as_f64(), Some(1.5));
        assert_eq!(StoreValue::from_bool(true).as_f64(), None);
        assert_eq!(StoreValue::null().type_name(), "null");
    }
}
