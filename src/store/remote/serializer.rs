use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value as JsonValue};

use crate::store::error::{internal_error, invalid_argument, StoreResult};
use crate::store::model::{DatabaseId, DocumentKey, GeoPoint};
use crate::store::snapshot::DocumentSnapshot;
use crate::store::value::{MapValue, StoreValue, ValueKind};

/// Server-side array transform applied by a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayTransform {
    AppendMissing,
    RemoveAll,
}

impl ArrayTransform {
    fn as_str(&self) -> &'static str {
        match self {
            ArrayTransform::AppendMissing => "appendMissingElements",
            ArrayTransform::RemoveAll => "removeAllFromArray",
        }
    }
}

#[derive(Clone, Debug)]
pub struct JsonProtoSerializer {
    database_id: DatabaseId,
}

impl JsonProtoSerializer {
    pub fn new(database_id: DatabaseId) -> Self {
        Self { database_id }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    pub fn database_name(&self) -> String {
        self.database_id.database_name()
    }

    pub fn document_name(&self, key: &DocumentKey) -> String {
        format!("{}/documents/{}", self.database_name(), key.canonical_string())
    }

    pub fn parse_document_name(&self, name: &str) -> StoreResult<DocumentKey> {
        let prefix = format!("{}/documents/", self.database_name());
        let relative = name.strip_prefix(&prefix).ok_or_else(|| {
            internal_error(format!("Unexpected document name '{name}' returned by the store"))
        })?;
        DocumentKey::from_string(relative)
    }

    /// Overwrites a single field of an existing document.
    pub fn encode_field_update_write(
        &self,
        key: &DocumentKey,
        field: &str,
        value: &StoreValue,
    ) -> JsonValue {
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), encode_value(value));
        json!({
            "update": {
                "name": self.document_name(key),
                "fields": fields,
            },
            "updateMask": { "fieldPaths": [quote_field_path(field)] },
            "currentDocument": { "exists": true }
        })
    }

    /// Applies an array transform to a single field of an existing document.
    pub fn encode_array_transform_write(
        &self,
        key: &DocumentKey,
        field: &str,
        transform: ArrayTransform,
        value: &StoreValue,
    ) -> JsonValue {
        let mut field_transform = serde_json::Map::new();
        field_transform.insert("fieldPath".to_string(), json!(quote_field_path(field)));
        field_transform.insert(
            transform.as_str().to_string(),
            json!({ "values": [encode_value(value)] }),
        );
        json!({
            "transform": {
                "document": self.document_name(key),
                "fieldTransforms": [JsonValue::Object(field_transform)],
            },
            "currentDocument": { "exists": true }
        })
    }

    /// Decodes a `Document` resource into a snapshot.
    pub fn decode_document(&self, document: &JsonValue) -> StoreResult<DocumentSnapshot> {
        let name = document
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| internal_error("document resource missing 'name' field"))?;
        let key = self.parse_document_name(name)?;
        let fields = decode_map_value(document)?;
        Ok(DocumentSnapshot::new(key, Some(fields)))
    }

    pub fn encode_value(&self, value: &StoreValue) -> JsonValue {
        encode_value(value)
    }

    pub fn decode_value(&self, value: &JsonValue) -> StoreResult<StoreValue> {
        decode_value(value)
    }

    pub fn reference_value(&self, key: &DocumentKey) -> JsonValue {
        json!({ "referenceValue": self.document_name(key) })
    }
}

/// Back-quotes field names that are not plain identifiers.
pub(crate) fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_map_fields(map: &MapValue) -> JsonValue {
    let mut fields = serde_json::Map::new();
    for (key, value) in map.fields() {
        fields.insert(key.clone(), encode_value(value));
    }
    JsonValue::Object(fields)
}

fn encode_value(value: &StoreValue) -> JsonValue {
    match value.kind() {
        ValueKind::Null => json!({ "nullValue": JsonValue::Null }),
        ValueKind::Boolean(boolean) => json!({ "booleanValue": boolean }),
        ValueKind::Integer(integer) => json!({ "integerValue": integer.to_string() }),
        ValueKind::Double(double) => json!({ "doubleValue": double }),
        ValueKind::Timestamp(timestamp) => json!({
            "timestampValue": timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
        }),
        ValueKind::String(string) => json!({ "stringValue": string }),
        ValueKind::Reference(reference) => json!({ "referenceValue": reference }),
        ValueKind::GeoPoint(point) => json!({
            "geoPointValue": {
                "latitude": point.latitude(),
                "longitude": point.longitude(),
            }
        }),
        ValueKind::Array(array) => {
            let values = array.values().iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        ValueKind::Map(map) => json!({
            "mapValue": {
                "fields": encode_map_fields(map)
            }
        }),
    }
}

fn decode_map_value(value: &JsonValue) -> StoreResult<MapValue> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected object for map value"))?;
    let fields_object = match map.get("fields") {
        Some(fields_value) => fields_value
            .as_object()
            .ok_or_else(|| invalid_argument("Expected 'fields' to be an object"))?,
        None => return Ok(MapValue::default()),
    };

    let mut fields = BTreeMap::new();
    for (key, value) in fields_object {
        fields.insert(key.clone(), decode_value(value)?);
    }
    Ok(MapValue::new(fields))
}

fn decode_value(value: &JsonValue) -> StoreResult<StoreValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid_argument("Expected store value object"))?;
    if let Some(null_value) = object.get("nullValue") {
        if null_value.is_null() || null_value.as_str() == Some("NULL_VALUE") {
            return Ok(StoreValue::null());
        }
    }
    if let Some(bool_value) = object.get("booleanValue") {
        let value = bool_value
            .as_bool()
            .ok_or_else(|| invalid_argument("booleanValue must be bool"))?;
        return Ok(StoreValue::from_bool(value));
    }
    if let Some(integer_value) = object.get("integerValue") {
        let parsed = match integer_value {
            JsonValue::String(value) => i64::from_str(value)
                .map_err(|err| invalid_argument(format!("Invalid integerValue: {err}")))?,
            JsonValue::Number(number) => number
                .as_i64()
                .ok_or_else(|| invalid_argument("Integer out of range"))?,
            _ => return Err(invalid_argument("integerValue must be a string or number")),
        };
        return Ok(StoreValue::from_integer(parsed));
    }
    if let Some(double_value) = object.get("doubleValue") {
        let parsed = match double_value {
            JsonValue::Number(number) => number
                .as_f64()
                .ok_or_else(|| invalid_argument("Invalid doubleValue"))?,
            JsonValue::String(value) => value
                .parse::<f64>()
                .map_err(|err| invalid_argument(format!("Invalid doubleValue: {err}")))?,
            _ => return Err(invalid_argument("doubleValue must be a number or string")),
        };
        return Ok(StoreValue::from_double(parsed));
    }
    if let Some(timestamp_value) = object.get("timestampValue") {
        let timestamp = timestamp_value
            .as_str()
            .ok_or_else(|| invalid_argument("timestampValue must be string"))?;
        let parsed = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|err| invalid_argument(format!("Invalid timestamp: {err}")))?;
        return Ok(StoreValue::from_timestamp(parsed.with_timezone(&Utc)));
    }
    if let Some(string_value) = object.get("stringValue") {
        let str_value = string_value
            .as_str()
            .ok_or_else(|| invalid_argument("stringValue must be string"))?;
        return Ok(StoreValue::from_string(str_value));
    }
    if let Some(reference_value) = object.get("referenceValue") {
        let str_value = reference_value
            .as_str()
            .ok_or_else(|| invalid_argument("referenceValue must be string"))?;
        return Ok(StoreValue::from_reference(str_value));
    }
    if let Some(geo_point) = object.get("geoPointValue") {
        let latitude = geo_point
            .get("latitude")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        let longitude = geo_point
            .get("longitude")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        return Ok(StoreValue::from_geo_point(GeoPoint::new(latitude, longitude)?));
    }
    if let Some(array_value) = object.get("arrayValue") {
        let decoded = match array_value.get("values").and_then(JsonValue::as_array) {
            Some(entries) => entries
                .iter()
                .map(decode_value)
                .collect::<StoreResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        return Ok(StoreValue::from_array(decoded));
    }
    if let Some(map_value) = object.get("mapValue") {
        let map = decode_map_value(map_value)?;
        return Ok(StoreValue::from_map(map.fields().clone()));
    }

    Err(invalid_argument("Unknown store value type"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serializer() -> JsonProtoSerializer {
        JsonProtoSerializer::new(DatabaseId::default("field-guide"))
    }

    #[test]
    fn decodes_document_with_mixed_fields() {
        let document = json!({
            "name": "projects/field-guide/databases/(default)/documents/locations/loc1",
            "fields": {
                "name": { "stringValue": "Lavender patch" },
                "visits": { "integerValue": "12" },
                "coordinates": { "geoPointValue": { "latitude": 45.5, "longitude": 9.2 } },
                "likes": { "arrayValue": { "values": [ { "stringValue": "u1" } ] } },
                "empty": { "arrayValue": {} }
            }
        });
        let snapshot = serializer().decode_document(&document).unwrap();
        assert_eq!(snapshot.id(), "loc1");
        assert_eq!(snapshot.get("visits"), Some(&StoreValue::from_integer(12)));
        assert_eq!(snapshot.get("likes"), Some(&StoreValue::string_array(["u1"])));
        assert_eq!(snapshot.get("empty"), Some(&StoreValue::from_array(Vec::new())));
        assert_eq!(
            snapshot.get("coordinates"),
            Some(&StoreValue::from_geo_point(GeoPoint::new(45.5, 9.2).unwrap()))
        );
    }

    #[test]
    fn document_without_fields_decodes_to_empty_map() {
        let document = json!({
            "name": "projects/field-guide/databases/(default)/documents/locations/bare"
        });
        let snapshot = serializer().decode_document(&document).unwrap();
        assert!(snapshot.exists());
        assert!(snapshot.data().unwrap().fields().is_empty());
    }

    #[test]
    fn rejects_foreign_document_names() {
        let err = serializer()
            .parse_document_name("projects/other/databases/(default)/documents/locations/x")
            .unwrap_err();
        assert_eq!(err.code_str(), "store/internal");
    }

    #[test]
    fn encodes_array_transform() {
        let key = DocumentKey::new("locations", "loc1").unwrap();
        let write = serializer().encode_array_transform_write(
            &key,
            "likes",
            ArrayTransform::AppendMissing,
            &StoreValue::from_string("u1"),
        );
        assert_eq!(
            write,
            json!({
                "transform": {
                    "document": "projects/field-guide/databases/(default)/documents/locations/loc1",
                    "fieldTransforms": [{
                        "fieldPath": "likes",
                        "appendMissingElements": { "values": [ { "stringValue": "u1" } ] }
                    }]
                },
                "currentDocument": { "exists": true }
            })
        );
    }

    #[test]
    fn quotes_non_identifier_fields() {
        assert_eq!(quote_field_path("likes"), "likes");
        assert_eq!(quote_field_path("liked-by"), "`liked-by`");
        assert_eq!(quote_field_path("1st"), "`1st`");
    }
}
