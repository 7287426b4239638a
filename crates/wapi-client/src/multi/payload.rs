//! Step payloads
//!
//! A payload carries three kinds of entries: plain fields (also used as
//! search filters on reads), extensible attributes to add or replace
//! (`extattrs+`) and extensible attributes to remove (`extattrs-`).

use super::state::StateStore;
use super::template::{MissingKey, Template, TemplateValue, compile_text};
use crate::error::WapiError;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Wire key for attributes to add or replace
pub const EA_ADD_KEY: &str = "extattrs+";
/// Wire key for attributes to remove
pub const EA_REMOVE_KEY: &str = "extattrs-";

/// Body or search filter of one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, Value>,
    ea_add: BTreeMap<String, Value>,
    ea_remove: BTreeSet<String>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain field, or a search filter when the step is a read
    ///
    /// A `*Name` field filters on extensible attribute `Name`.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Add or replace extensible attribute `name`
    pub fn add_ea(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        self.ea_remove.remove(&name);
        self.ea_add.insert(name, value.into());
    }

    /// Remove extensible attribute `name`
    pub fn remove_ea(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.ea_add.remove(&name);
        self.ea_remove.insert(name);
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn ea_add(&self) -> &BTreeMap<String, Value> {
        &self.ea_add
    }

    pub fn ea_remove(&self) -> &BTreeSet<String> {
        &self.ea_remove
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.ea_add.is_empty() && self.ea_remove.is_empty()
    }

    /// Wire form: plain fields plus `extattrs+` / `extattrs-` sections
    pub fn to_json(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !self.ea_add.is_empty() {
            let add: Map<String, Value> = self
                .ea_add
                .iter()
                .map(|(k, v)| (k.clone(), json!({ "value": v })))
                .collect();
            map.insert(EA_ADD_KEY.to_string(), Value::Object(add));
        }
        if !self.ea_remove.is_empty() {
            let remove: Map<String, Value> = self
                .ea_remove
                .iter()
                .map(|k| (k.clone(), json!({})))
                .collect();
            map.insert(EA_REMOVE_KEY.to_string(), Value::Object(remove));
        }
        map
    }

    /// Parse the wire form back into its three kinds of entries
    pub fn from_json(map: &Map<String, Value>) -> Result<Self, WapiError> {
        let mut payload = Self::new();
        for (key, value) in map {
            match key.as_str() {
                EA_ADD_KEY => {
                    for (name, wrapped) in section(key, value)? {
                        let inner = wrapped.get("value").ok_or_else(|| {
                            WapiError::InvalidRequest(format!(
                                "{EA_ADD_KEY} entry '{name}' must be of the form {{\"value\": ...}}"
                            ))
                        })?;
                        payload.add_ea(name.clone(), inner.clone());
                    }
                }
                EA_REMOVE_KEY => {
                    for (name, _) in section(key, value)? {
                        payload.remove_ea(name.clone());
                    }
                }
                _ => payload.set_field(key.clone(), value.clone()),
            }
        }
        Ok(payload)
    }
}

fn section<'a>(key: &str, value: &'a Value) -> Result<&'a Map<String, Value>, WapiError> {
    value
        .as_object()
        .ok_or_else(|| WapiError::InvalidRequest(format!("{key} must be an object")))
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Payload with every key and string value parsed into templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledPayload {
    fields: Vec<(Template, TemplateValue)>,
    ea_add: Vec<(Template, TemplateValue)>,
    ea_remove: Vec<Template>,
}

impl CompiledPayload {
    pub fn compile(payload: &Payload, substitute: bool) -> Self {
        let entries = |map: &BTreeMap<String, Value>| -> Vec<(Template, TemplateValue)> {
            map.iter()
                .map(|(k, v)| (compile_text(k, substitute), TemplateValue::compile(v, substitute)))
                .collect()
        };
        Self {
            fields: entries(&payload.fields),
            ea_add: entries(&payload.ea_add),
            ea_remove: payload
                .ea_remove
                .iter()
                .map(|k| compile_text(k, substitute))
                .collect(),
        }
    }

    /// Evaluate against `state`, producing a concrete payload
    pub fn resolve(&self, state: &StateStore) -> Result<Payload, MissingKey> {
        let mut payload = Payload::new();
        for (key, value) in &self.fields {
            payload.set_field(key.render(state)?, value.resolve(state)?);
        }
        for (key, value) in &self.ea_add {
            payload.add_ea(key.render(state)?, value.resolve(state)?);
        }
        for key in &self.ea_remove {
            payload.remove_ea(key.render(state)?);
        }
        Ok(payload)
    }
}
