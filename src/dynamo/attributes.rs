use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dynamo::value::AttributeValue;

/// Immutable map of attribute names to values.
///
/// Every `with*` call returns a new map; the receiver is never changed, so
/// clones are cheap and can be shared between frames, cursors and items.
/// Names are case-sensitive.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Attributes(Arc<BTreeMap<String, AttributeValue>>);

impl Attributes {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with one attribute added or replaced.
    pub fn with(&self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let mut map = (*self.0).clone();
        map.insert(name.into(), value.into());
        Self(Arc::new(map))
    }

    /// Copy with every attribute of `other` added or replaced.
    pub fn with_all(&self, other: &Attributes) -> Self {
        let mut map = (*self.0).clone();
        map.extend(other.iter().map(|(name, value)| (name.clone(), value.clone())));
        Self(Arc::new(map))
    }

    /// Copy holding only the named attributes that are present.
    pub fn only<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let map = names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.0.get(name).map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Self(Arc::new(map))
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attributes in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValue> {
        self.0.iter()
    }

    /// Attribute names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = btree_map::Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        ))
    }
}

impl From<BTreeMap<String, AttributeValue>> for Attributes {
    fn from(map: BTreeMap<String, AttributeValue>) -> Self {
        Self(Arc::new(map))
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, AttributeValue>::deserialize(deserializer).map(Self::from)
    }
}

/// Kind of change an update applies to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeAction {
    Put,
    Add,
    Delete,
}

/// One attribute change: a value plus the action applied with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueUpdate {
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<AttributeValue>,
    #[serde(rename = "Action")]
    pub action: AttributeAction,
}

impl AttributeValueUpdate {
    /// Replace the attribute with `value`.
    pub fn put(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: Some(value.into()),
            action: AttributeAction::Put,
        }
    }

    /// Add `value` to a number (or to a set).
    pub fn add(value: impl Into<AttributeValue>) -> Self {
        Self {
            value: Some(value.into()),
            action: AttributeAction::Add,
        }
    }

    /// Remove the attribute.
    pub fn delete() -> Self {
        Self {
            value: None,
            action: AttributeAction::Delete,
        }
    }
}

/// Immutable map of attribute names to updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeUpdates(Arc<BTreeMap<String, AttributeValueUpdate>>);

impl AttributeUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with one update added or replaced.
    pub fn with(&self, name: impl Into<String>, update: AttributeValueUpdate) -> Self {
        let mut map = (*self.0).clone();
        map.insert(name.into(), update);
        Self(Arc::new(map))
    }

    /// Copy with a PUT of `value` for `name`.
    pub fn with_value(&self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(name, AttributeValueUpdate::put(value))
    }

    /// Copy with every update of `other` added or replaced.
    pub fn with_all(&self, other: &AttributeUpdates) -> Self {
        let mut map = (*self.0).clone();
        map.extend(other.iter().map(|(name, update)| (name.clone(), update.clone())));
        Self(Arc::new(map))
    }

    /// Update of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&AttributeValueUpdate> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Updates in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValueUpdate> {
        self.0.iter()
    }
}

impl Serialize for AttributeUpdates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
