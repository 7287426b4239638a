//! WAPI object models
//!
//! Only the shapes the client itself needs: extensible attributes and the
//! network view that carries the lock attributes.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// WAPI object type of a network view
pub const NETWORK_VIEW: &str = "networkview";

/// Extensible attributes of an object
///
/// Serializes to the wire shape `{"Name": {"value": V}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ea(BTreeMap<String, Value>);

#[derive(Serialize, Deserialize)]
struct EaValue {
    value: Value,
}

impl Ea {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set attribute `name` to `value`
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder form of [`Ea::insert`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove attribute `name`, returning its value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of attribute `name`, if it holds a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Integer value of attribute `name`
    ///
    /// String values holding a decimal integer are accepted, since older grids
    /// return INTEGER attributes as strings.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Attribute names, in sorted order
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl Serialize for Ea {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, &EaValue { value: value.clone() })?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ea {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, EaValue>::deserialize(deserializer)?;
        Ok(Self(raw.into_iter().map(|(k, v)| (k, v.value)).collect()))
    }
}

/// Network view object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkView {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extattrs: Ea,
}

/// Object type of a WAPI reference, e.g. `networkview` for
/// `networkview/ZG5zLm5ldHdvcmtfdmlldyQw:default/true`
pub fn object_type_of(reference: &str) -> &str {
    reference.split_once('/').map_or(reference, |(kind, _)| kind)
}

/// True if `target` looks like an object reference rather than a bare type
pub fn is_reference(target: &str) -> bool {
    target.contains('/')
}

/// Value of extensible attribute `name` inside a raw WAPI object
pub fn ea_value<'a>(object: &'a Value, name: &str) -> Option<&'a Value> {
    object.get("extattrs")?.get(name)?.get("value")
}
