//! FILENAME: core/records/src/record.rs
//! PURPOSE: One flat (or shallow-nested) data row.
//! CONTEXT: Records within a collection share a schema only loosely, so a
//! missing field is simply absent from the map. Records are owned by the caller
//! and only ever borrowed by the engines.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::path::{extract, FieldPath};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: FxHashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    /// Top-level lookup by exact field name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Lookup through a (possibly dotted) field path.
    pub fn extract(&self, path: &FieldPath) -> Option<&Value> {
        extract(self, path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
