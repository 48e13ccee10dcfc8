use crate::store::value::StoreValue;

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    values: Vec<StoreValue>,
}

impl ArrayValue {
    pub fn new(values: Vec<StoreValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[StoreValue] {
        &self.values
    }

    pub fn contains(&self, needle: &StoreValue) -> bool {
        self.values.iter().any(|candidate| candidate == needle)
    }

    /// Appends `value` unless an equal element is already present.
    pub(crate) fn union_with(&mut self, value: StoreValue) {
        if !self.contains(&value) {
            self.values.push(value);
        }
    }

    /// Removes every element equal to `value`.
    pub(crate) fn remove_all(&mut self, value: &StoreValue) {
        self.values.retain(|candidate| candidate != value);
    }
}
