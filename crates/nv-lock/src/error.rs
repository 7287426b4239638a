//! Lock errors

use std::time::Duration;
use thiserror::Error;
use wapi_client::WapiError;

/// Errors that can occur while taking or releasing a network view lock
#[derive(Debug, Error)]
pub enum LockError {
    /// WAPI or multi-request error
    #[error("WAPI error: {0}")]
    Wapi(#[from] WapiError),

    /// The network view carrying the lock does not exist
    #[error("Network view not found: {0}")]
    ResourceNotFound(String),

    /// Invalid lock configuration
    #[error("Invalid lock configuration: {0}")]
    InvalidConfig(String),

    /// The lock is held by someone else
    #[error("Lock on network view {resource} is held by {}", .holder.as_deref().unwrap_or("an unknown holder"))]
    NotAcquired {
        resource: String,
        holder: Option<String>,
    },

    /// The holder kept the lock longer than the timeout
    #[error("Lock on network view {resource} held by {} timed out after {}s", .holder.as_deref().unwrap_or("an unknown holder"), .held_for.as_secs())]
    LockTimedOut {
        resource: String,
        holder: Option<String>,
        held_for: Duration,
    },

    /// Every acquisition attempt failed
    #[error("Failed to get lock on network view {resource} after {attempts} attempts")]
    RetryExhausted { resource: String, attempts: u32 },

    /// Acquisition stopped by a shutdown signal
    #[error("Lock acquisition on network view {0} was cancelled")]
    Cancelled(String),

    /// Acquisition ran past its configured deadline
    #[error("Lock acquisition on network view {0} exceeded its deadline")]
    DeadlineExceeded(String),

    /// The release batch ran but the marker was not reset
    #[error("Failed to release lock from network view {0}")]
    ReleaseFailed(String),
}
