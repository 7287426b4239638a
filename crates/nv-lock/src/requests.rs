//! Canned multi-requests that take and release the lock
//!
//! The lock lives in two extensible attributes of a network view. Taking it
//! is a conditional read (only matches while the marker is free) followed by
//! an unconditional write; this is not an atomic compare-and-swap, and two
//! clients can both pass the read before either writes. The final read-back
//! decides who actually holds the lock.

use crate::config::LockConfig;
use wapi_client::models::NETWORK_VIEW;
use wapi_client::{MultiRequest, StepDescriptor};

/// State key holding the network view reference
pub const NET_VIEW_REF_KEY: &str = "NET_VIEW_REF";
/// State key holding the marker value read back at the end of a batch
pub const HOLDER_KEY: &str = "LOCK_HOLDER";

fn net_view_ref() -> String {
    format!("##STATE:{NET_VIEW_REF_KEY}:##")
}

/// Batch that claims the lock for `tenant_id` at Unix time `now`
pub fn acquire_request(config: &LockConfig, name: &str, tenant_id: &str, now: i64) -> MultiRequest {
    MultiRequest::new(vec![
        StepDescriptor::get(NETWORK_VIEW)
            .field("name", name)
            .field(format!("*{}", config.marker_ea), config.available_value.as_str())
            .return_fields(&["extattrs"])
            .capture(NET_VIEW_REF_KEY, "_ref")
            .discarded(),
        StepDescriptor::update(net_view_ref())
            .ea_add(config.marker_ea.as_str(), tenant_id)
            .ea_add(config.timestamp_ea.as_str(), now)
            .with_substitution()
            .discarded(),
        StepDescriptor::get(net_view_ref())
            .return_fields(&["extattrs"])
            .capture(HOLDER_KEY, format!("*{}", config.marker_ea))
            .with_substitution()
            .discarded(),
        StepDescriptor::display_state(),
    ])
}

/// Batch that frees the lock
///
/// Unless `force` is set, the first read only matches while `tenant_id`
/// holds the lock.
pub fn release_request(config: &LockConfig, name: &str, tenant_id: &str, force: bool) -> MultiRequest {
    let mut lookup = StepDescriptor::get(NETWORK_VIEW).field("name", name);
    if !force {
        lookup = lookup.field(format!("*{}", config.marker_ea), tenant_id);
    }

    MultiRequest::new(vec![
        lookup
            .return_fields(&["extattrs"])
            .capture(NET_VIEW_REF_KEY, "_ref")
            .discarded(),
        StepDescriptor::update(net_view_ref())
            .ea_add(config.marker_ea.as_str(), config.available_value.as_str())
            .with_substitution()
            .discarded(),
        StepDescriptor::update(net_view_ref())
            .ea_remove(config.timestamp_ea.as_str())
            .with_substitution()
            .discarded(),
        StepDescriptor::get(net_view_ref())
            .return_fields(&["extattrs"])
            .capture(HOLDER_KEY, format!("*{}", config.marker_ea))
            .with_substitution()
            .discarded(),
        StepDescriptor::display_state(),
    ])
}
