//! Object manager
//!
//! Typed requests against a [`Connector`] on behalf of one tenant.

use crate::connector::{Connector, QueryArgs};
use crate::error::WapiError;
use crate::models::{Ea, NETWORK_VIEW, NetworkView};
use crate::multi::{BatchResult, MultiRequest, Payload};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Issues typed requests for a single tenant
#[derive(Clone)]
pub struct ObjectManager {
    connector: Arc<dyn Connector>,
    tenant_id: String,
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

fn return_fields(fields: &str) -> QueryArgs {
    QueryArgs::from([("_return_fields".to_string(), fields.to_string())])
}

impl ObjectManager {
    pub fn new(connector: Arc<dyn Connector>, tenant_id: impl Into<String>) -> Self {
        Self {
            connector,
            tenant_id: tenant_id.into(),
        }
    }

    /// Identity this manager acts for
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Look up a network view by name, with its extensible attributes
    pub async fn get_network_view(&self, name: &str) -> Result<Option<NetworkView>, WapiError> {
        let mut search = Map::new();
        search.insert("name".to_string(), Value::String(name.to_string()));

        let response = self
            .connector
            .get_object(NETWORK_VIEW, &search, &return_fields("name,extattrs"))
            .await?;

        let first = match response {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            Value::Array(_) => return Ok(None),
            single => single,
        };
        Ok(Some(serde_json::from_value(first)?))
    }

    /// Create a network view; returns its reference
    pub async fn create_network_view(&self, name: &str, extattrs: Ea) -> Result<String, WapiError> {
        debug!("Creating network view {}", name);
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(name.to_string()));
        if !extattrs.is_empty() {
            body.insert("extattrs".to_string(), serde_json::to_value(&extattrs)?);
        }

        let response = self
            .connector
            .create_object(NETWORK_VIEW, &body, &QueryArgs::new())
            .await?;
        reference_of(response)
    }

    /// Add/replace and remove extensible attributes on a network view
    pub async fn update_network_view_ea(
        &self,
        reference: &str,
        add: &Ea,
        remove: &[&str],
    ) -> Result<String, WapiError> {
        debug!("Updating extensible attributes of {}", reference);
        let mut payload = Payload::new();
        for (name, value) in add.iter() {
            payload.add_ea(name.clone(), value.clone());
        }
        for name in remove {
            payload.remove_ea(*name);
        }

        let response = self
            .connector
            .update_object(reference, &payload.to_json(), &QueryArgs::new())
            .await?;
        reference_of(response)
    }

    /// Run a multi-request and return its caller-visible results
    pub async fn create_multi_object(&self, request: &MultiRequest) -> Result<BatchResult, WapiError> {
        self.connector.execute_batch(request).await
    }
}

fn reference_of(response: Value) -> Result<String, WapiError> {
    match response {
        Value::String(reference) => Ok(reference),
        Value::Object(map) => map
            .get("_ref")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WapiError::InvalidRequest("response has no _ref".to_string())),
        other => Err(WapiError::InvalidRequest(format!("unexpected response: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConnector;
    use crate::multi::StepDescriptor;
    use serde_json::json;

    fn manager() -> (MockConnector, ObjectManager) {
        let mock = MockConnector::new();
        let manager = ObjectManager::new(Arc::new(mock.clone()), "tenant-a");
        (mock, manager)
    }

    #[tokio::test]
    async fn test_network_view_lifecycle() {
        let (mock, manager) = manager();
        assert!(manager.get_network_view("blue").await.unwrap().is_none());

        let reference = manager
            .create_network_view("blue", Ea::new().with("Lock", "Available"))
            .await
            .unwrap();

        let nv = manager.get_network_view("blue").await.unwrap().unwrap();
        assert_eq!(nv.reference, reference);
        assert_eq!(nv.name, "blue");
        assert_eq!(nv.extattrs.get_str("Lock"), Some("Available"));

        manager
            .update_network_view_ea(&reference, &Ea::new().with("LockTime", 5), &["Lock"])
            .await
            .unwrap();
        let stored = mock.object(&reference).unwrap();
        assert_eq!(stored["extattrs"], json!({"LockTime": {"value": 5}}));
    }

    #[tokio::test]
    async fn test_create_multi_object() {
        let (mock, manager) = manager();
        mock.add_object("networkview", json!({"name": "blue"}));

        let request = MultiRequest::new(vec![
            StepDescriptor::get("networkview")
                .field("name", "blue")
                .capture("REF", "_ref")
                .discarded(),
            StepDescriptor::display_state(),
        ]);
        let result = manager.create_multi_object(&request).await.unwrap();
        assert!(result.captured_str("REF").unwrap().starts_with("networkview/"));
        assert_eq!(manager.tenant_id(), "tenant-a");
    }
}
