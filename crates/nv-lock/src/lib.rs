//! Network view lock
//!
//! A distributed advisory lock stored in two extensible attributes of an
//! Infoblox network view: a marker holding either the free value or the
//! holder's tenant id, and the Unix time the lock was taken. Every
//! acquisition and release is one WAPI multi-request.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nv_lock::{LockConfig, NvLocker};
//! use wapi_client::{ObjectManager, WapiClient, WapiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let wapi = WapiClient::new(&WapiConfig::from_env()?)?;
//! let manager = ObjectManager::new(Arc::new(wapi), "tenant-a");
//! let locker = NvLocker::new(manager, "default", LockConfig::new("Lock", "LockTimeout"))?;
//!
//! locker.acquire().await?;
//! // ... work on the network view ...
//! locker.release().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The lock is advisory and not atomic: the grid offers no compare-and-swap,
//! so two tenants can both observe a free marker. The read-back at the end of
//! each batch decides which of them actually holds it.

pub mod backoff;
pub mod config;
pub mod error;
pub mod locker;
pub mod requests;

pub use backoff::UniformBackoff;
pub use config::LockConfig;
pub use error::LockError;
pub use locker::{LockAttempt, NvLocker};
pub use requests::{acquire_request, release_request};
