// Copyright © 2024 Pathway

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher as _};

use arcstr::ArcStr;
use indexmap::IndexMap;
use itertools::Itertools as _;
use serde_json::{Map as JsonMap, Value as JsonValue};
use xxhash_rust::xxh3::Xxh3 as Hasher;

use super::error::{DataError, Result};
use super::value::{HashInto, Key, Value};

/// Batch identifiers: a mapping from attribute name to value.
///
/// Keeps insertion order for display, but equality, hashing and ordering
/// do not depend on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdDict(IndexMap<ArcStr, Value>);

impl IdDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a JSON object, turning nested objects into nested dictionaries.
    pub fn from_json(json: JsonValue) -> Result<Self> {
        match json {
            JsonValue::Object(map) => Ok(Self::from(map)),
            other => Err(DataError::TypeMismatch {
                expected: "dictionary",
                value: Value::from(other),
            }
            .into()),
        }
    }

    pub fn insert(&mut self, key: impl Into<ArcStr>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArcStr> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArcStr, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_json()))
                .collect(),
        )
    }

    fn sorted_entries(&self) -> Vec<(&ArcStr, &Value)> {
        self.0.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)).collect()
    }
}

impl Hash for IdDict {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let entries = self.sorted_entries();
        state.write_usize(entries.len());
        for (key, value) in entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl PartialOrd for IdDict {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdDict {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted_entries().cmp(&other.sorted_entries())
    }
}

impl HashInto for IdDict {
    fn hash_into(&self, hasher: &mut Hasher) {
        let entries = self.sorted_entries();
        entries.len().hash_into(hasher);
        for (key, value) in entries {
            key.hash_into(hasher);
            value.hash_into(hasher);
        }
    }
}

impl Display for IdDict {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{{{}}}",
            self.0
                .iter()
                .format_with(", ", |(key, value), f| f(&format_args!("{key:?}: {value}")))
        )
    }
}

impl From<JsonMap<String, JsonValue>> for IdDict {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Self(
            map.into_iter()
                .map(|(key, value)| (ArcStr::from(key), Value::from(value)))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for IdDict
where
    K: Into<ArcStr>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Everything needed to tell one batch of data apart from another: where it
/// comes from and the identifiers the data connector extracted for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchDefinition {
    datasource_name: String,
    data_connector_name: String,
    data_asset_name: String,
    batch_identifiers: IdDict,
}

impl BatchDefinition {
    pub fn new(
        datasource_name: impl Into<String>,
        data_connector_name: impl Into<String>,
        data_asset_name: impl Into<String>,
        batch_identifiers: IdDict,
    ) -> Self {
        Self {
            datasource_name: datasource_name.into(),
            data_connector_name: data_connector_name.into(),
            data_asset_name: data_asset_name.into(),
            batch_identifiers,
        }
    }

    pub fn datasource_name(&self) -> &str {
        &self.datasource_name
    }

    pub fn data_connector_name(&self) -> &str {
        &self.data_connector_name
    }

    pub fn data_asset_name(&self) -> &str {
        &self.data_asset_name
    }

    pub fn batch_identifiers(&self) -> &IdDict {
        &self.batch_identifiers
    }

    /// Doesn't depend on the order in which identifiers were inserted.
    pub fn id(&self) -> Key {
        Key::for_values(&[
            Value::from(self.datasource_name.as_str()),
            Value::from(self.data_connector_name.as_str()),
            Value::from(self.data_asset_name.as_str()),
            Value::from(self.batch_identifiers.clone()),
        ])
    }

    pub fn to_json(&self) -> JsonValue {
        let mut fields = JsonMap::new();
        fields.insert(
            "datasource_name".to_string(),
            self.datasource_name.clone().into(),
        );
        fields.insert(
            "data_connector_name".to_string(),
            self.data_connector_name.clone().into(),
        );
        fields.insert(
            "data_asset_name".to_string(),
            self.data_asset_name.clone().into(),
        );
        fields.insert(
            "batch_identifiers".to_string(),
            self.batch_identifiers.to_json(),
        );
        JsonValue::Object(fields)
    }
}

impl Display for BatchDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let serialized = serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error)?;
        write!(f, "{serialized}")
    }
}
