//! Typed key/value properties.
//!
//! Handlers read application settings through a [`PropertySource`]. Values
//! are a tagged [`PropertyValue`]; typed getters never coerce, a value of the
//! wrong kind is reported as [`PropertyError::TypeMismatch`]. Key/type
//! agreement is the caller's convention, not a schema.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<PropertyValue>),
    Table(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Name of the variant, used in mismatch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Table(_) => "table",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<V: Into<PropertyValue>> From<Vec<V>> for PropertyValue {
    fn from(values: Vec<V>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<toml::Value> for PropertyValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Integer(i),
            toml::Value::Float(f) => Self::Float(f),
            toml::Value::Boolean(b) => Self::Boolean(b),
            toml::Value::Datetime(d) => Self::String(d.to_string()),
            toml::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(table) => Self::Table(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("property {0:?} is not set")]
    Missing(String),

    #[error("property {key:?} is a {found}, expected a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Source of properties matched by key.
pub trait PropertySource: Send + Sync {
    /// Raw lookup.
    fn get(&self, key: &str) -> Option<&PropertyValue>;

    fn get_string(&self, key: &str) -> Result<&str, PropertyError> {
        typed(key, self.get(key), "string", PropertyValue::as_str)
    }

    fn get_int(&self, key: &str) -> Result<i64, PropertyError> {
        typed(key, self.get(key), "integer", PropertyValue::as_int)
    }

    fn get_float(&self, key: &str) -> Result<f64, PropertyError> {
        typed(key, self.get(key), "float", PropertyValue::as_float)
    }

    fn get_bool(&self, key: &str) -> Result<bool, PropertyError> {
        typed(key, self.get(key), "boolean", PropertyValue::as_bool)
    }
}

fn typed<'a, T>(
    key: &str,
    value: Option<&'a PropertyValue>,
    expected: &'static str,
    cast: impl FnOnce(&'a PropertyValue) -> Option<T>,
) -> Result<T, PropertyError> {
    let value = value.ok_or_else(|| PropertyError::Missing(key.to_string()))?;
    cast(value).ok_or_else(|| PropertyError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: value.kind(),
    })
}

/// Flat, top-level-keys-only property source.
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    values: HashMap<String, PropertyValue>,
}

impl MapPropertySource {
    pub fn new(values: HashMap<String, PropertyValue>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for MapPropertySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl PropertySource for MapPropertySource {
    fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }
}

/// Property source over a TOML table; dotted keys reach into nested tables.
#[derive(Debug, Clone, Default)]
pub struct TomlPropertySource {
    root: BTreeMap<String, PropertyValue>,
}

impl TomlPropertySource {
    pub fn from_table(table: toml::Table) -> Self {
        Self {
            root: table
                .into_iter()
                .map(|(k, v)| (k, PropertyValue::from(v)))
                .collect(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        Ok(Self::from_table(content.parse::<toml::Table>()?))
    }
}

impl PropertySource for TomlPropertySource {
    fn get(&self, key: &str) -> Option<&PropertyValue> {
        if let Some(value) = self.root.get(key) {
            return Some(value);
        }

        let mut segments = key.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }
}
