//! Infoblox WAPI client
//!
//! A Rust client for the Infoblox WAPI with a client-side multi-request
//! interpreter: several dependent object calls run as one batch, with values
//! captured from earlier responses substituted into later steps.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wapi_client::{MultiRequest, ObjectManager, StepDescriptor, WapiClient, WapiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WapiConfig::new("gm.example.com", "admin", "infoblox");
//! let manager = ObjectManager::new(Arc::new(WapiClient::new(&config)?), "tenant-a");
//!
//! // Find a network view, tag it, and read the tag back in one batch
//! let request = MultiRequest::new(vec![
//!     StepDescriptor::get("networkview")
//!         .field("name", "default")
//!         .capture("NET_VIEW_REF", "_ref")
//!         .discarded(),
//!     StepDescriptor::update("##STATE:NET_VIEW_REF:##")
//!         .ea_add("Owner", "tenant-a")
//!         .with_substitution()
//!         .discarded(),
//!     StepDescriptor::get("##STATE:NET_VIEW_REF:##")
//!         .return_fields(&["extattrs"])
//!         .capture("OWNER", "*Owner")
//!         .with_substitution()
//!         .discarded(),
//!     StepDescriptor::display_state(),
//! ]);
//! let result = manager.create_multi_object(&request).await?;
//! println!("owner: {:?}", result.captured_str("OWNER"));
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Connector trait**: object-level verbs, implemented over HTTPS and in memory
//! - **Multi-request**: ordered steps with state capture and `##STATE:<Key>:##` substitution
//! - **Extensible attributes**: typed `Ea` maps and `extattrs+` / `extattrs-` payloads
//! - **Mocking**: `MockConnector` behind the `test-util` feature

pub mod client;
pub mod common;
pub mod config;
pub mod connector;
pub mod error;
pub mod models;
pub mod multi;
pub mod object_manager;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::WapiClient;
pub use common::HttpClient;
pub use config::WapiConfig;
pub use connector::{Connector, QueryArgs};
pub use error::WapiError;
pub use models::{Ea, NetworkView};
pub use multi::{BatchResult, Method, MultiRequest, Payload, Selector, StateStore, StepDescriptor};
pub use object_manager::ObjectManager;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockConnector;
