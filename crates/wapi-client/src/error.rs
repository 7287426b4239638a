//! WAPI client errors

use thiserror::Error;

/// Errors that can occur when talking to the WAPI or running a multi-request
#[derive(Debug, Error)]
pub enum WapiError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WAPI returned a non-success status
    #[error("WAPI error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or backend message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Object or reference not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., a step the connector cannot dispatch)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A step referenced a state key that no earlier step captured
    #[error("Step {step} references unset state key '{key}'")]
    MissingState {
        /// Zero-based step index
        step: usize,
        /// The unresolved state key
        key: String,
    },

    /// A capture rule could not be satisfied by the step's response
    #[error("Step {step} could not capture '{key}' from selector '{selector}'")]
    CaptureFailed {
        /// Zero-based step index
        step: usize,
        /// State key being assigned
        key: String,
        /// Response field selector
        selector: String,
    },

    /// The connector call behind a step failed
    #[error("Step {step} ({method} {target}) failed: {source}")]
    StepFailed {
        /// Zero-based step index
        step: usize,
        /// Wire method of the failed step
        method: String,
        /// Resolved target of the failed step
        target: String,
        /// Underlying connector error
        #[source]
        source: Box<WapiError>,
    },
}

impl WapiError {
    /// True when a batch aborted because a conditional lookup matched no object.
    ///
    /// Lookups by type return an empty list on no match, which surfaces as a
    /// failed capture; a lookup by reference surfaces as `NotFound`.
    pub fn is_no_match(&self) -> bool {
        match self {
            Self::CaptureFailed { .. } | Self::NotFound(_) => true,
            Self::StepFailed { source, .. } => source.is_no_match(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_classification() {
        let capture = WapiError::CaptureFailed {
            step: 0,
            key: "NET_VIEW_REF".to_string(),
            selector: "_ref".to_string(),
        };
        assert!(capture.is_no_match());

        let wrapped = WapiError::StepFailed {
            step: 2,
            method: "GET".to_string(),
            target: "networkview/abc".to_string(),
            source: Box::new(WapiError::NotFound("networkview/abc".to_string())),
        };
        assert!(wrapped.is_no_match());

        let api = WapiError::Api { status: 500, message: "boom".to_string() };
        assert!(!api.is_no_match());
        assert!(!WapiError::MissingState { step: 1, key: "X".to_string() }.is_no_match());
    }

    #[test]
    fn test_error_display() {
        let err = WapiError::MissingState { step: 3, key: "REF".to_string() };
        assert_eq!(err.to_string(), "Step 3 references unset state key 'REF'");

        let err = WapiError::StepFailed {
            step: 1,
            method: "PUT".to_string(),
            target: "networkview/xyz".to_string(),
            source: Box::new(WapiError::Api { status: 400, message: "bad".to_string() }),
        };
        assert_eq!(
            err.to_string(),
            "Step 1 (PUT networkview/xyz) failed: WAPI error (400): bad"
        );
    }
}
