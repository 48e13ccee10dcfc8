use std::collections::BTreeMap;

use crate::store::value::StoreValue;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapValue {
    fields: BTreeMap<String, StoreValue>,
}

impl MapValue {
    pub fn new(fields: BTreeMap<String, StoreValue>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, StoreValue> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.fields.get(field)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut BTreeMap<String, StoreValue> {
        &mut self.fields
    }
}

impl<K: Into<String>> FromIterator<(K, StoreValue)> for MapValue {
    fn from_iter<T: IntoIterator<Item = (K, StoreValue)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_map_entries() {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), StoreValue::from_string("Meadow"));
        let value = MapValue::new(map.clone());
        assert_eq!(value.fields().get("name"), map.get("name"));
        assert_eq!(value.get("name"), Some(&StoreValue::from_string("Meadow")));
    }

    #[test]
    fn collects_from_pairs() {
        let value: MapValue = [("count", StoreValue::from_integer(2))].into_iter().collect();
        assert_eq!(value.get("count"), Some(&StoreValue::from_integer(2)));
    }
}
