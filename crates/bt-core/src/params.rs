#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{ConstructionError, Result};

/// String key/value parameters handed to a node builder.
///
/// Keys are unique and iteration order is sorted by key. Interpreting the values is up to the
/// node being built; the typed lookups below turn a missing or unparsable value into a
/// [`ConstructionError`] naming the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeParameters {
    values: BTreeMap<String, String>,
}

impl NodeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The raw value for `key`, or [`ConstructionError::MissingParameter`].
    pub fn require(&self, node: &str, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| ConstructionError::MissingParameter {
                node: node.to_string(),
                key: key.to_string(),
            })
    }

    /// Parses the required value for `key` as `T`.
    pub fn parse<T>(&self, node: &str, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.require(node, key)?;
        parse_value(node, key, raw)
    }

    /// Parses `key` as `T` if present, falling back to `default` when absent. A present but
    /// unparsable value is still an error.
    pub fn parse_or<T>(&self, node: &str, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => parse_value(node, key, raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(node: &str, key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConstructionError::InvalidParameter {
            node: node.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
            reason: err.to_string(),
        })
}

impl<K, V> FromIterator<(K, V)> for NodeParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for NodeParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl From<BTreeMap<String, String>> for NodeParameters {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}
