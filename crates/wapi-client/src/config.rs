//! WAPI connection configuration
//!
//! Settings can be built in code or read from `WAPI_*` environment variables.

use crate::error::WapiError;
use std::time::Duration;

/// Default WAPI version used when none is configured
pub const DEFAULT_WAPI_VERSION: &str = "2.7";

/// Connection settings for a WAPI grid master
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WapiConfig {
    /// Grid master host name or address
    pub host: String,
    /// HTTPS port
    pub port: u16,
    /// WAPI version, e.g. "2.7"
    pub version: String,
    /// Basic-auth user name
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// Verify the appliance's TLS certificate
    pub ssl_verify: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for WapiConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 443,
            version: DEFAULT_WAPI_VERSION.to_string(),
            username: String::new(),
            password: String::new(),
            ssl_verify: true,
            timeout: Duration::from_secs(60),
        }
    }
}

impl WapiConfig {
    /// Create a config for `host` with the given credentials
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Set the HTTPS port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the WAPI version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable TLS certificate verification
    #[must_use]
    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = ssl_verify;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL for object requests, always ending in `/`
    pub fn base_url(&self) -> String {
        format!("https://{}:{}/wapi/v{}/", self.host, self.port, self.version)
    }

    /// Load configuration from `WAPI_*` environment variables
    ///
    /// `WAPI_HOST`, `WAPI_USERNAME` and `WAPI_PASSWORD` are required.
    pub fn from_env() -> Result<Self, WapiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WapiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| WapiError::Config(format!("{key} environment variable is required")))
        };

        let mut config = Self::new(
            required("WAPI_HOST")?,
            required("WAPI_USERNAME")?,
            required("WAPI_PASSWORD")?,
        );

        if let Some(port) = lookup("WAPI_PORT") {
            config.port = port
                .parse()
                .map_err(|_| WapiError::Config(format!("WAPI_PORT is not a valid port: {port}")))?;
        }
        if let Some(version) = lookup("WAPI_VERSION") {
            config.version = version;
        }
        if let Some(verify) = lookup("WAPI_SSL_VERIFY") {
            config.ssl_verify = match verify.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(WapiError::Config(format!(
                        "WAPI_SSL_VERIFY must be true or false, got {other}"
                    )));
                }
            };
        }
        if let Some(secs) = lookup("WAPI_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| WapiError::Config(format!("WAPI_TIMEOUT_SECS is not a number: {secs}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_base_url() {
        let config = WapiConfig::new("gm.example.com", "admin", "secret").with_version("2.12");
        assert_eq!(config.base_url(), "https://gm.example.com:443/wapi/v2.12/");
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = WapiConfig::from_lookup(lookup(&[
            ("WAPI_HOST", "10.0.0.1"),
            ("WAPI_USERNAME", "admin"),
            ("WAPI_PASSWORD", "infoblox"),
        ]))
        .unwrap();

        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 443);
        assert_eq!(config.version, DEFAULT_WAPI_VERSION);
        assert!(config.ssl_verify);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = WapiConfig::from_lookup(lookup(&[
            ("WAPI_HOST", "gm"),
            ("WAPI_USERNAME", "admin"),
            ("WAPI_PASSWORD", "infoblox"),
            ("WAPI_PORT", "8443"),
            ("WAPI_VERSION", "2.5"),
            ("WAPI_SSL_VERIFY", "false"),
            ("WAPI_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8443);
        assert_eq!(config.version, "2.5");
        assert!(!config.ssl_verify);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_missing_host() {
        let err = WapiConfig::from_lookup(lookup(&[("WAPI_USERNAME", "admin")])).unwrap_err();
        assert!(matches!(err, WapiError::Config(msg) if msg.contains("WAPI_HOST")));
    }

    #[test]
    fn test_from_lookup_bad_port() {
        let err = WapiConfig::from_lookup(lookup(&[
            ("WAPI_HOST", "gm"),
            ("WAPI_USERNAME", "admin"),
            ("WAPI_PASSWORD", "infoblox"),
            ("WAPI_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, WapiError::Config(_)));
    }
}
