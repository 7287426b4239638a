//! Connector trait
//!
//! Abstracts the four WAPI object verbs so the multi-request interpreter and
//! the lock can run against the HTTP client or an in-memory mock.

use crate::error::WapiError;
use crate::multi::{self, BatchResult, MultiRequest};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Query parameters appended to a request, e.g. `_return_fields`
pub type QueryArgs = BTreeMap<String, String>;

/// Object-level WAPI operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Create an object of `object_type`; returns the new object's reference
    async fn create_object(
        &self,
        object_type: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError>;

    /// Read objects
    ///
    /// A bare object type performs a search filtered by `search` and returns
    /// a JSON array; a reference returns that single object.
    async fn get_object(
        &self,
        target: &str,
        search: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError>;

    /// Update the object at `reference`; returns its (possibly new) reference
    async fn update_object(
        &self,
        reference: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError>;

    /// Delete the object at `reference`; returns the deleted reference
    async fn delete_object(&self, reference: &str, args: &QueryArgs) -> Result<Value, WapiError>;

    /// Run a multi-request against this connector, step by step
    async fn execute_batch(&self, request: &MultiRequest) -> Result<BatchResult, WapiError> {
        multi::execute(self, request).await
    }
}
