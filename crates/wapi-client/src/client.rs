//! WAPI HTTP connector
//!
//! Maps the four object verbs onto the WAPI REST surface:
//! `GET <type>?<search>&<args>`, `GET <ref>`, `POST <type>`, `PUT <ref>`,
//! `DELETE <ref>`.

use crate::common::HttpClient;
use crate::common::query::{build_query_string, search_query, with_query};
use crate::config::WapiConfig;
use crate::connector::{Connector, QueryArgs};
use crate::error::WapiError;
use crate::models::is_reference;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;

/// WAPI client over HTTPS
#[derive(Debug, Clone)]
pub struct WapiClient {
    http: HttpClient,
}

impl WapiClient {
    /// Create a client for the grid master described by `config`
    pub fn new(config: &WapiConfig) -> Result<Self, WapiError> {
        if config.host.is_empty() {
            return Err(WapiError::Config("WAPI host must not be empty".to_string()));
        }
        Self::with_base_url(&config.base_url(), config)
    }

    /// Create a client against an explicit base URL, e.g. a test server
    pub fn with_base_url(base_url: &str, config: &WapiConfig) -> Result<Self, WapiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url, config.username.clone(), config.password.clone()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait::async_trait]
impl Connector for WapiClient {
    async fn create_object(
        &self,
        object_type: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        debug!("Creating {} object", object_type);
        let path = with_query(object_type, &build_query_string(args));
        self.http.post(&path, body).await
    }

    async fn get_object(
        &self,
        target: &str,
        search: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        let query = if is_reference(target) {
            build_query_string(args)
        } else {
            search_query(search, args)
        };
        self.http.get(&with_query(target, &query)).await
    }

    async fn update_object(
        &self,
        reference: &str,
        body: &Map<String, Value>,
        args: &QueryArgs,
    ) -> Result<Value, WapiError> {
        if !is_reference(reference) {
            return Err(WapiError::InvalidRequest(format!(
                "update needs an object reference, got '{reference}'"
            )));
        }
        debug!("Updating {}", reference);
        let path = with_query(reference, &build_query_string(args));
        self.http.put(&path, body).await
    }

    async fn delete_object(&self, reference: &str, args: &QueryArgs) -> Result<Value, WapiError> {
        if !is_reference(reference) {
            return Err(WapiError::InvalidRequest(format!(
                "delete needs an object reference, got '{reference}'"
            )));
        }
        debug!("Deleting {}", reference);
        let path = with_query(reference, &build_query_string(args));
        self.http.delete(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_base_url() {
        let config = WapiConfig::new("gm.example.com", "admin", "infoblox").with_version("2.10");
        let client = WapiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://gm.example.com:443/wapi/v2.10/");
    }

    #[test]
    fn test_client_rejects_empty_host() {
        let config = WapiConfig::new("", "admin", "infoblox");
        assert!(matches!(WapiClient::new(&config), Err(WapiError::Config(_))));
    }

    #[tokio::test]
    async fn test_update_requires_reference() {
        let config = WapiConfig::new("gm", "admin", "infoblox");
        let client = WapiClient::new(&config).unwrap();
        let err = client
            .update_object("networkview", &Map::new(), &QueryArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WapiError::InvalidRequest(_)));
    }
}
