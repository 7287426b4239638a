//! Mock connector for unit testing
//!
//! This module provides an in-memory implementation of [`Connector`] so the
//! multi-request interpreter and anything built on it can be tested without a
//! grid master.
//!
//! - `helpers.rs` - search matching, return-field projection and EA merges

mod helpers;

pub use helpers::{apply_update, matches, project};

use crate::connector::{Connector, QueryArgs};
use crate::error::WapiError;
use crate::models::{is_reference, object_type_of};
use crate::multi::Method;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A connector call seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: Method,
    pub target: String,
    pub body: Map<String, Value>,
    pub args: QueryArgs,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    method: Method,
    status: u16,
    message: String,
}

/// In-memory WAPI object store
///
/// Clones share the same store, so several clients (e.g. competing lock
/// holders) can race against one backend.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    // Objects keyed by reference, in creation order
    objects: Arc<Mutex<IndexMap<String, Value>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    failures: Arc<Mutex<VecDeque<InjectedFailure>>>,
    next_id: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the store (for test setup) and return its reference
    pub fn add_object(&self, object_type: &str, fields: Value) -> String {
        let mut object = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id = self.next_id();
        let label = object
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| id.to_string(), str::to_string);
        let reference = format!("{object_type}/bW9jaw{id}:{label}");
        object.insert("_ref".to_string(), Value::String(reference.clone()));
        lock(&self.objects).insert(reference.clone(), Value::Object(object));
        reference
    }

    /// Current state of the object at `reference`
    pub fn object(&self, reference: &str) -> Option<Value> {
        lock(&self.objects).get(reference).cloned()
    }

    /// First object of `object_type` named `name`
    pub fn find(&self, object_type: &str, name: &str) -> Option<Value> {
        lock(&self.objects)
            .iter()
            .find(|(reference, object)| {
                object_type_of(reference) == object_type
                    && object.get("name").and_then(Value::as_str) == Some(name)
            })
            .map(|(_, object)| object.clone())
    }

    /// Make the next call with `method` fail with the given status
    pub fn fail_next(&self, method: Method, status: u16, message: impl Into<String>) {
        lock(&self.failures).push_back(InjectedFailure {
            method,
            status,
            message: message.into(),
        });
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_id(&self) -> u64 {
        let mut id = lock(&self.next_id);
        *id += 1;
        *id
    }

    fn record(&self, method: Method, target: &str, body: &Map<String, Value>, args: &QueryArgs) -> Result<(), WapiError> {
        lock(&self.calls).push(MockCall {
            method,
            target: target.to_string(),
            body: body.clone(),
            args: args.clone(),
        });

        let mut failures = lock(&self.failures);
        if let Some(pos) = failures.iter().position(|f| f.method == method) {
            if let Some(failure) = failures.remove(pos) {
                return Err(WapiError::Api {
                    status: failure.status,
                    message: failure.message,
                });
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn create_object(
        &self,
        object_type: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        self.record(Method::Post, object_type, body, args)?;
        if is_reference(object_type) {
            return Err(WapiError::Api {
                status: 400,
                message: format!("cannot create object at reference {object_type}"),
            });
        }
        Ok(Value::String(self.add_object(object_type, Value::Object(body.clone()))))
    }

    async fn get_object(
        &self,
        target: &str,
        search: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        self.record(Method::Get, target, search, args)?;
        let objects = lock(&self.objects);

        if is_reference(target) {
            return objects
                .get(target)
                .map(|object| project(object, args))
                .ok_or_else(|| WapiError::NotFound(target.to_string()));
        }

        Ok(Value::Array(
            objects
                .iter()
                .filter(|(reference, object)| {
                    object_type_of(reference) == target && matches(object, search)
                })
                .map(|(_, object)| project(object, args))
                .collect(),
        ))
    }

    async fn update_object(
        &self,
        reference: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        self.record(Method::Put, reference, body, args)?;
        let mut objects = lock(&self.objects);
        let object = objects
            .get_mut(reference)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| WapiError::NotFound(reference.to_string()))?;
        apply_update(object, body)?;
        Ok(Value::String(reference.to_string()))
    }

    async fn delete_object(&self, reference: &str, args: &QueryArgs) -> Result<Value, WapiError> {
        self.record(Method::Delete, reference, &Map::new(), args)?;
        lock(&self.objects)
            .shift_remove(reference)
            .map(|_| Value::String(reference.to_string()))
            .ok_or_else(|| WapiError::NotFound(reference.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let mock = MockConnector::new();
        let created = mock
            .create_object("networkview", json!({"name": "red"}).as_object().unwrap(), &QueryArgs::new())
            .await
            .unwrap();
        let reference = created.as_str().unwrap().to_string();
        assert!(reference.starts_with("networkview/"));

        let found = mock
            .get_object("networkview", json!({"name": "red"}).as_object().unwrap(), &QueryArgs::new())
            .await
            .unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);

        mock.update_object(&reference, json!({"comment": "x"}).as_object().unwrap(), &QueryArgs::new())
            .await
            .unwrap();
        assert_eq!(mock.object(&reference).unwrap()["comment"], json!("x"));

        mock.delete_object(&reference, &QueryArgs::new()).await.unwrap();
        assert!(mock.object(&reference).is_none());
        assert_eq!(mock.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_get_missing_reference() {
        let mock = MockConnector::new();
        let err = mock
            .get_object("networkview/nope:x", &Map::new(), &QueryArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WapiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let mock = MockConnector::new();
        mock.fail_next(Method::Get, 503, "grid busy");

        let err = mock
            .get_object("networkview", &Map::new(), &QueryArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WapiError::Api { status: 503, .. }));
        assert!(mock.get_object("networkview", &Map::new(), &QueryArgs::new()).await.is_ok());
    }

    #[test]
    fn test_clones_share_store() {
        let mock = MockConnector::new();
        let other = mock.clone();
        let reference = mock.add_object("networkview", json!({"name": "shared"}));
        assert!(other.object(&reference).is_some());
        assert!(other.find("networkview", "shared").is_some());
    }
}
