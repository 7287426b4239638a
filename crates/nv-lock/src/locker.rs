//! Network view lock
//!
//! [`NvLocker`] takes and releases the lock through the canned batches in
//! [`crate::requests`]. A lock whose timestamp is older than the configured
//! timeout is treated as abandoned and forcibly released. Takeover and
//! contention retries share one bounded loop.

use crate::backoff::UniformBackoff;
use crate::config::LockConfig;
use crate::error::LockError;
use crate::requests::{HOLDER_KEY, acquire_request, release_request};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wapi_client::multi::value_text;
use wapi_client::{Ea, NetworkView, ObjectManager};

/// Outcome of a single acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    /// The caller now holds the lock
    Acquired,
    /// Someone else holds the lock and it has not timed out
    Held { holder: Option<String> },
    /// Someone else holds the lock past the timeout
    Expired {
        holder: Option<String>,
        held_for: Duration,
    },
}

impl LockAttempt {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }

    /// Convert a failed attempt into the matching recoverable error
    pub fn into_result(self, resource: &str) -> Result<(), LockError> {
        match self {
            Self::Acquired => Ok(()),
            Self::Held { holder } => Err(LockError::NotAcquired {
                resource: resource.to_string(),
                holder,
            }),
            Self::Expired { holder, held_for } => Err(LockError::LockTimedOut {
                resource: resource.to_string(),
                holder,
                held_for,
            }),
        }
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Advisory lock on one network view, for one tenant
#[derive(Debug, Clone)]
pub struct NvLocker {
    manager: ObjectManager,
    name: String,
    config: LockConfig,
}

impl NvLocker {
    /// Create a locker for network view `name`, acting as the manager's tenant
    pub fn new(manager: ObjectManager, name: impl Into<String>, config: LockConfig) -> Result<Self, LockError> {
        config.validate()?;
        if manager.tenant_id().is_empty() {
            return Err(LockError::InvalidConfig("tenant id must not be empty".to_string()));
        }
        Ok(Self {
            manager,
            name: name.into(),
            config,
        })
    }

    /// Network view the lock lives on
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tenant_id(&self) -> &str {
        self.manager.tenant_id()
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Make sure the marker EA exists, initializing it to the free value
    pub async fn ensure_marker(&self) -> Result<NetworkView, LockError> {
        let mut nv = self
            .manager
            .get_network_view(&self.name)
            .await?
            .ok_or_else(|| LockError::ResourceNotFound(self.name.clone()))?;

        if !nv.extattrs.contains(&self.config.marker_ea) {
            debug!(network_view = %self.name, ea = %self.config.marker_ea, "Initializing lock marker");
            let marker = Ea::new().with(self.config.marker_ea.as_str(), self.config.available_value.as_str());
            self.manager
                .update_network_view_ea(&nv.reference, &marker, &[])
                .await?;
            nv.extattrs
                .insert(self.config.marker_ea.as_str(), self.config.available_value.as_str());
        }
        Ok(nv)
    }

    /// One acquisition attempt, without takeover or retry
    pub async fn try_lock(&self) -> Result<LockAttempt, LockError> {
        debug!(network_view = %self.name, "Creating lock on network view");
        let request = acquire_request(&self.config, &self.name, self.tenant_id(), unix_now());

        match self.manager.create_multi_object(&request).await {
            Ok(result) => {
                let holder = result.captured(HOLDER_KEY).map(value_text);
                if holder.as_deref() == Some(self.tenant_id()) {
                    info!(network_view = %self.name, tenant = %self.tenant_id(), "Got the lock");
                    Ok(LockAttempt::Acquired)
                } else {
                    debug!(network_view = %self.name, holder = ?holder, "Lost the race for the lock");
                    Ok(LockAttempt::Held { holder })
                }
            }
            Err(e) if e.is_no_match() => {
                debug!(network_view = %self.name, error = %e, "Lock not free, checking its age");
                self.check_expiry().await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the current holder and decide whether the lock has timed out
    async fn check_expiry(&self) -> Result<LockAttempt, LockError> {
        let nv = self
            .manager
            .get_network_view(&self.name)
            .await?
            .ok_or_else(|| LockError::ResourceNotFound(self.name.clone()))?;

        let holder = nv.extattrs.get(&self.config.marker_ea).map(value_text);
        let Some(taken_at) = nv.extattrs.get_i64(&self.config.timestamp_ea) else {
            return Ok(LockAttempt::Held { holder });
        };

        let age = unix_now().saturating_sub(taken_at);
        let timeout = i64::try_from(self.config.lock_timeout.as_secs()).unwrap_or(i64::MAX);
        if age > timeout {
            Ok(LockAttempt::Expired {
                holder,
                held_for: Duration::from_secs(age.unsigned_abs()),
            })
        } else {
            Ok(LockAttempt::Held { holder })
        }
    }

    /// Try to take the lock, forcing out an expired holder
    ///
    /// Returns `false` when a live holder has the lock. Every forced release
    /// is followed by another attempt; at most `max_attempts` takeovers are made.
    pub async fn lock(&self) -> Result<bool, LockError> {
        let mut takeovers = 0;
        loop {
            match self.try_lock().await?.into_result(&self.name) {
                Ok(()) => return Ok(true),
                Err(e @ LockError::LockTimedOut { .. }) => {
                    if takeovers == self.config.max_attempts {
                        return Ok(false);
                    }
                    takeovers += 1;
                    self.take_over(&e).await?;
                }
                Err(LockError::NotAcquired { .. }) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
    }

    /// Release the lock
    ///
    /// Without `force` only the current holder can release it. Returns `true`
    /// when the marker reads back as free.
    pub async fn unlock(&self, force: bool) -> Result<bool, LockError> {
        debug!(network_view = %self.name, force, "Releasing lock from network view");
        let request = release_request(&self.config, &self.name, self.tenant_id(), force);

        match self.manager.create_multi_object(&request).await {
            Ok(result) => {
                let marker = result.captured(HOLDER_KEY).map(value_text);
                if marker.as_deref() == Some(self.config.available_value.as_str()) {
                    info!(network_view = %self.name, "Removed the lock on network view");
                    Ok(true)
                } else {
                    debug!(network_view = %self.name, marker = ?marker, "Lock marker not reset");
                    Ok(false)
                }
            }
            Err(e) if e.is_no_match() => {
                debug!(network_view = %self.name, error = %e, "Lock is not held by this tenant");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release a lock this tenant holds
    pub async fn release(&self) -> Result<(), LockError> {
        if self.unlock(false).await? {
            Ok(())
        } else {
            Err(LockError::ReleaseFailed(self.name.clone()))
        }
    }

    /// Release the lock whoever holds it
    pub async fn force_release(&self) -> Result<(), LockError> {
        if self.unlock(true).await? {
            Ok(())
        } else {
            Err(LockError::ReleaseFailed(self.name.clone()))
        }
    }

    async fn take_over(&self, reason: &LockError) -> Result<(), LockError> {
        warn!(network_view = %self.name, reason = %reason, "Lock is timed out. Forcefully acquiring it.");
        if !self.unlock(true).await? {
            debug!(network_view = %self.name, "Forced release did not reset the marker");
        }
        Ok(())
    }

    /// Take the lock, waiting for it if necessary
    ///
    /// Initializes the marker EA if missing, then retries up to
    /// `max_attempts` times with a random backoff between attempts. An
    /// expired lock is released and retried immediately, without using up
    /// one of those attempts.
    pub async fn acquire(&self) -> Result<(), LockError> {
        self.acquire_inner(None).await
    }

    /// [`NvLocker::acquire`] that stops when `shutdown` turns `true`
    pub async fn acquire_with_shutdown(&self, shutdown: watch::Receiver<bool>) -> Result<(), LockError> {
        self.acquire_inner(Some(shutdown)).await
    }

    async fn acquire_inner(&self, mut shutdown: Option<watch::Receiver<bool>>) -> Result<(), LockError> {
        self.ensure_marker().await?;

        let started = Instant::now();
        let max_attempts = self.config.max_attempts;
        let backoff = UniformBackoff::new(self.config.backoff_min, self.config.backoff_max);

        // Contended attempts count toward the bound; an attempt that ends in a
        // takeover does not, so a forced release is always followed by a retry.
        let mut attempt = 0;
        let mut takeovers = 0;
        let mut tries = 0;
        loop {
            if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
                return Err(LockError::Cancelled(self.name.clone()));
            }
            self.check_deadline(started)?;

            tries += 1;
            match self.try_lock().await?.into_result(&self.name) {
                Ok(()) => {
                    info!(network_view = %self.name, tries, "Got the lock on network view");
                    return Ok(());
                }
                Err(e @ LockError::LockTimedOut { .. }) => {
                    if takeovers == max_attempts {
                        break;
                    }
                    takeovers += 1;
                    self.take_over(&e).await?;
                }
                Err(e @ LockError::NotAcquired { .. }) => {
                    attempt += 1;
                    if attempt == max_attempts {
                        break;
                    }
                    debug!(
                        network_view = %self.name,
                        reason = %e,
                        "Lock not free. Retrying again {} out of {}.",
                        attempt,
                        max_attempts
                    );
                    let delay = self.cap_to_deadline(backoff.next_delay(), started);
                    pause(delay, &mut shutdown)
                        .await
                        .map_err(|()| LockError::Cancelled(self.name.clone()))?;
                }
                Err(e) => return Err(e),
            }
        }

        Err(LockError::RetryExhausted {
            resource: self.name.clone(),
            attempts: tries,
        })
    }

    fn check_deadline(&self, started: Instant) -> Result<(), LockError> {
        match self.config.deadline {
            Some(deadline) if started.elapsed() >= deadline => {
                Err(LockError::DeadlineExceeded(self.name.clone()))
            }
            _ => Ok(()),
        }
    }

    fn cap_to_deadline(&self, delay: Duration, started: Instant) -> Duration {
        match self.config.deadline {
            Some(deadline) => delay.min(deadline.saturating_sub(started.elapsed())),
            None => delay,
        }
    }
}

/// Sleep for `delay`; `Err(())` if the shutdown signal fires first
async fn pause(delay: Duration, shutdown: &mut Option<watch::Receiver<bool>>) -> Result<(), ()> {
    let Some(rx) = shutdown.as_mut() else {
        tokio::time::sleep(delay).await;
        return Ok(());
    };

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return Ok(()),
            changed = rx.changed() => match changed {
                Ok(()) if *rx.borrow() => return Err(()),
                Ok(()) => {}
                // Sender gone; nothing can cancel any more
                Err(_) => {
                    (&mut sleep).await;
                    return Ok(());
                }
            },
        }
    }
}
