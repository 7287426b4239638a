//! Step descriptors
//!
//! One step is one logical WAPI call inside a multi-request. Steps serialize
//! to the body shape of the WAPI `request` object.

use super::payload::{CompiledPayload, Payload};
use super::state::StateStore;
use super::template::{MissingKey, Template, compile_text};
use crate::connector::QueryArgs;
use crate::error::WapiError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Operation performed by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
    /// No network call; the step's result is the whole state store
    #[serde(rename = "STATE:DISPLAY")]
    StateDisplay,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::StateDisplay => "STATE:DISPLAY",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a capture rule reads its value from in a step's response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// A top-level response field such as `_ref`
    Field(String),
    /// The value of an extensible attribute, written `*Name`
    ExtAttr(String),
}

impl Selector {
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix('*') {
            Some(name) => Self::ExtAttr(name.to_string()),
            None => Self::Field(text.to_string()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::ExtAttr(name) => write!(f, "*{name}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for Selector {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| Self::parse(&s))
    }
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if passes a reference")]
fn is_false(value: &bool) -> bool {
    !*value
}

/// One unit of work in a multi-request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDescriptor {
    pub method: Method,
    /// Object type, literal reference, or a `##STATE:<Key>:##` token
    #[serde(rename = "object", skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(rename = "data", skip_serializing_if = "Payload::is_empty")]
    pub payload: Payload,
    #[serde(rename = "args", skip_serializing_if = "QueryArgs::is_empty")]
    pub query_args: QueryArgs,
    /// State key to response selector
    #[serde(rename = "assign_state", skip_serializing_if = "IndexMap::is_empty")]
    pub capture: IndexMap<String, Selector>,
    #[serde(rename = "enable_substitution", skip_serializing_if = "is_false")]
    pub substitution: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub discard: bool,
}

impl StepDescriptor {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            payload: Payload::new(),
            query_args: QueryArgs::new(),
            capture: IndexMap::new(),
            substitution: false,
            discard: false,
        }
    }

    /// Read by object type (search) or by reference
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn create(object_type: impl Into<String>) -> Self {
        Self::new(Method::Post, object_type)
    }

    pub fn update(target: impl Into<String>) -> Self {
        Self::new(Method::Put, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    /// Pseudo-step exposing the accumulated state as its result
    pub fn display_state() -> Self {
        Self::new(Method::StateDisplay, "")
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.set_field(name, value);
        self
    }

    #[must_use]
    pub fn ea_add(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.add_ea(name, value);
        self
    }

    #[must_use]
    pub fn ea_remove(mut self, name: impl Into<String>) -> Self {
        self.payload.remove_ea(name);
        self
    }

    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_args.insert(name.into(), value.into());
        self
    }

    /// Shorthand for the `_return_fields` query argument
    #[must_use]
    pub fn return_fields(self, fields: &[&str]) -> Self {
        self.arg("_return_fields", fields.join(","))
    }

    /// Assign the value picked by `selector` to state key `key`
    #[must_use]
    pub fn capture(mut self, key: impl Into<String>, selector: impl Into<Selector>) -> Self {
        self.capture.insert(key.into(), selector.into());
        self
    }

    /// Resolve `##STATE:<Key>:##` tokens before this step runs
    #[must_use]
    pub fn with_substitution(mut self) -> Self {
        self.substitution = true;
        self
    }

    /// Keep this step's raw result out of the batch result
    #[must_use]
    pub fn discarded(mut self) -> Self {
        self.discard = true;
        self
    }
}

/// Step with its target and payload parsed into templates
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedStep {
    target: Template,
    payload: CompiledPayload,
}

/// Step after substitution, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    pub method: Method,
    pub target: String,
    pub payload: Payload,
    pub args: QueryArgs,
}

impl PreparedStep {
    pub(crate) fn compile(step: &StepDescriptor) -> Self {
        Self {
            target: compile_text(&step.target, step.substitution),
            payload: CompiledPayload::compile(&step.payload, step.substitution),
        }
    }

    pub(crate) fn resolve(
        &self,
        index: usize,
        step: &StepDescriptor,
        state: &StateStore,
    ) -> Result<ResolvedStep, WapiError> {
        let missing = |MissingKey(key)| WapiError::MissingState { step: index, key };
        Ok(ResolvedStep {
            method: step.method,
            target: self.target.render(state).map_err(missing)?,
            payload: self.payload.resolve(state).map_err(missing)?,
            args: step.query_args.clone(),
        })
    }
}

/// Substitute state references in `step`
///
/// Returns a copy with every `##STATE:<Key>:##` token in the target, payload
/// keys and payload values replaced. Steps without substitution enabled come
/// back unchanged. `index` is only used to label a `MissingState` error.
pub fn substitute(
    step: &StepDescriptor,
    index: usize,
    state: &StateStore,
) -> Result<StepDescriptor, WapiError> {
    let resolved = PreparedStep::compile(step).resolve(index, step, state)?;
    Ok(StepDescriptor {
        target: resolved.target,
        payload: resolved.payload,
        ..step.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lock_step() -> StepDescriptor {
        StepDescriptor::update("##STATE:NET_VIEW_REF:##")
            .ea_add("Lock", "tenant-a")
            .ea_add("LockTime", 1_700_000_000)
            .with_substitution()
            .discarded()
    }

    #[test]
    fn test_wire_serialization() {
        let step = StepDescriptor::get("networkview")
            .field("name", "default")
            .field("*Lock", "Available")
            .return_fields(&["extattrs"])
            .capture("NET_VIEW_REF", "_ref")
            .discarded();

        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({
                "method": "GET",
                "object": "networkview",
                "data": {"name": "default", "*Lock": "Available"},
                "args": {"_return_fields": "extattrs"},
                "assign_state": {"NET_VIEW_REF": "_ref"},
                "discard": true
            })
        );

        assert_eq!(
            serde_json::to_value(StepDescriptor::display_state()).unwrap(),
            json!({"method": "STATE:DISPLAY"})
        );
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(Selector::parse("_ref"), Selector::Field("_ref".to_string()));
        assert_eq!(Selector::parse("*Lock"), Selector::ExtAttr("Lock".to_string()));
        assert_eq!(Selector::parse("*Lock").to_string(), "*Lock");
    }

    #[test]
    fn test_substitute_without_tokens_is_identity() {
        let step = StepDescriptor::update("networkview/abc")
            .field("comment", "plain")
            .ea_remove("LockTime")
            .with_substitution();
        assert_eq!(substitute(&step, 0, &StateStore::new()).unwrap(), step);
    }

    #[test]
    fn test_substitute_replaces_target() {
        let mut state = StateStore::new();
        state.set("NET_VIEW_REF", json!("networkview/ZG5z:default/true"));

        let resolved = substitute(&lock_step(), 1, &state).unwrap();
        assert_eq!(resolved.target, "networkview/ZG5z:default/true");
        assert_eq!(resolved.payload, lock_step().payload);
    }

    #[test]
    fn test_substitute_disabled_is_verbatim() {
        let step = StepDescriptor::update("##STATE:NET_VIEW_REF:##").field("comment", "##STATE:X:##");
        assert_eq!(substitute(&step, 0, &StateStore::new()).unwrap(), step);
    }

    #[test]
    fn test_substitute_missing_state() {
        let err = substitute(&lock_step(), 1, &StateStore::new()).unwrap_err();
        assert!(matches!(
            err,
            WapiError::MissingState { step: 1, ref key } if key == "NET_VIEW_REF"
        ));
    }
}
