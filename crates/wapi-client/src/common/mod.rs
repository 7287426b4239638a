//! Common utilities for the WAPI HTTP connector
//!
//! Provides the authenticated HTTP wrapper shared by all verbs.

pub mod query;

use crate::error::WapiError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use tracing::debug;

/// HTTP client wrapper with basic authentication
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper; `base_url` gets a trailing `/`
    pub fn new(client: Client, base_url: &str, username: String, password: String) -> Self {
        Self {
            client,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            username,
            password,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an object type or reference
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Value, WapiError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        Self::into_json("GET", path, response).await
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: &Map<String, Value>) -> Result<Value, WapiError> {
        let url = self.build_url(path);
        let body_json = Value::Object(body.clone());
        debug!("POST {} with body: {}", url, body_json);

        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        Self::into_json("POST", path, response).await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: &Map<String, Value>) -> Result<Value, WapiError> {
        let url = self.build_url(path);
        let body_json = Value::Object(body.clone());
        debug!("PUT {} with body: {}", url, body_json);

        let response = self
            .authorized(self.client.put(&url))
            .json(body)
            .send()
            .await?;
        Self::into_json("PUT", path, response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Value, WapiError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.authorized(self.client.delete(&url)).send().await?;
        Self::into_json("DELETE", path, response).await
    }

    async fn into_json(verb: &str, path: &str, response: Response) -> Result<Value, WapiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(WapiError::NotFound(format!("{path} - {}", error_text(&body))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{} {} failed: {}", verb, path, status);
            return Err(WapiError::Api {
                status: status.as_u16(),
                message: error_text(&body),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pull the human-readable message out of a WAPI error body
///
/// WAPI errors look like `{"Error": "...", "code": "...", "text": "..."}`.
pub fn error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("text")
                .or_else(|| v.get("Error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
