//! Feature vector bound to the schema it was aligned to.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::FeatureSchema;

/// One value per schema column, in schema order.
///
/// The only way to obtain a vector is through `FeatureSchema::align`, so
/// its key set is always exactly the schema's.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f64>,
}

impl<'s> FeatureVector<'s> {
    pub(crate) fn new(schema: &'s FeatureSchema, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &'s FeatureSchema {
        self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &'s str> {
        self.schema.names()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'s str, f64)> + '_ {
        self.schema.names().zip(self.values.iter().copied())
    }

    pub(crate) fn set(&mut self, position: usize, value: f64) {
        self.values[position] = value;
    }
}

impl Serialize for FeatureVector<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
