//! Network View Lock
//!
//! Takes, releases or breaks the advisory lock on an Infoblox network view.
//! WAPI connection settings come from `WAPI_*` environment variables, the
//! lock settings from `NETWORK_VIEW`, `TENANT_ID`, `LOCK_*`.
//!
//! Acquisition stops early on Ctrl-C.

mod config;

use anyhow::{Context, Result};
use config::{Action, Settings};
use nv_lock::NvLocker;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wapi_client::{ObjectManager, WapiClient, WapiConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting network view lock");

    let wapi_config = WapiConfig::from_env().context("Invalid WAPI configuration")?;
    let settings = Settings::from_env()?;

    info!("Configuration:");
    info!("  WAPI endpoint: {}", wapi_config.base_url());
    info!("  Network view: {}", settings.network_view);
    info!("  Tenant: {}", settings.tenant_id);
    info!("  Action: {:?}", settings.action);

    let client = WapiClient::new(&wapi_config)?;
    let manager = ObjectManager::new(Arc::new(client), settings.tenant_id.as_str());
    let locker = NvLocker::new(manager, settings.network_view.as_str(), settings.lock)?;

    match settings.action {
        Action::Acquire => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, abandoning lock acquisition");
                    let _ = shutdown_tx.send(true);
                }
            });
            locker.acquire_with_shutdown(shutdown_rx).await?;
            info!("Lock on network view {} held by {}", locker.name(), locker.tenant_id());
        }
        Action::Release => {
            locker.release().await?;
            info!("Lock on network view {} released", locker.name());
        }
        Action::ForceRelease => {
            locker.force_release().await?;
            info!("Lock on network view {} forcibly released", locker.name());
        }
    }

    Ok(())
}
