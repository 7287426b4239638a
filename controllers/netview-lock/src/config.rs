//! Settings read from the environment

use anyhow::{Context, Result, anyhow, bail};
use nv_lock::LockConfig;
use std::str::FromStr;
use std::time::Duration;

/// What to do with the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Acquire,
    Release,
    ForceRelease,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acquire" | "lock" => Ok(Self::Acquire),
            "release" | "unlock" => Ok(Self::Release),
            "force-release" | "force-unlock" => Ok(Self::ForceRelease),
            other => Err(anyhow!("unknown LOCK_ACTION '{other}' (expected acquire, release or force-release)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub network_view: String,
    pub tenant_id: String,
    pub action: Action,
    pub lock: LockConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{key} environment variable is required"))
        };

        let network_view = lookup("NETWORK_VIEW").unwrap_or_else(|| "default".to_string());
        let tenant_id = required("TENANT_ID")?;
        let action = lookup("LOCK_ACTION")
            .as_deref()
            .unwrap_or("acquire")
            .parse()?;

        let mut lock = LockConfig::new(
            lookup("LOCK_EA").unwrap_or_else(|| "Lock".to_string()),
            lookup("LOCK_TIMEOUT_EA").unwrap_or_else(|| "LockTimeout".to_string()),
        );
        if let Some(secs) = lookup("LOCK_TIMEOUT_SECS") {
            lock = lock.with_lock_timeout(Duration::from_secs(parse_number("LOCK_TIMEOUT_SECS", &secs)?));
        }
        if let Some(attempts) = lookup("LOCK_MAX_ATTEMPTS") {
            let attempts = u32::try_from(parse_number("LOCK_MAX_ATTEMPTS", &attempts)?)
                .context("LOCK_MAX_ATTEMPTS is out of range")?;
            lock = lock.with_max_attempts(attempts);
        }
        if let Some(secs) = lookup("LOCK_DEADLINE_SECS") {
            lock = lock.with_deadline(Duration::from_secs(parse_number("LOCK_DEADLINE_SECS", &secs)?));
        }

        Ok(Self {
            network_view,
            tenant_id,
            action,
            lock,
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    match value.trim().parse() {
        Ok(n) => Ok(n),
        Err(_) => bail!("{key} must be a whole number, got '{value}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("acquire".parse::<Action>().unwrap(), Action::Acquire);
        assert_eq!("Release".parse::<Action>().unwrap(), Action::Release);
        assert_eq!("force-release".parse::<Action>().unwrap(), Action::ForceRelease);
        assert!("steal".parse::<Action>().is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[("TENANT_ID", "tenant-a")]).unwrap();
        assert_eq!(settings.network_view, "default");
        assert_eq!(settings.action, Action::Acquire);
        assert_eq!(settings.lock.marker_ea, "Lock");
        assert_eq!(settings.lock.timestamp_ea, "LockTimeout");
        assert_eq!(settings.lock.max_attempts, 10);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("TENANT_ID", "tenant-a"),
            ("NETWORK_VIEW", "blue"),
            ("LOCK_ACTION", "force-release"),
            ("LOCK_EA", "NvLock"),
            ("LOCK_TIMEOUT_EA", "NvLockTime"),
            ("LOCK_TIMEOUT_SECS", "300"),
            ("LOCK_MAX_ATTEMPTS", "3"),
            ("LOCK_DEADLINE_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(settings.network_view, "blue");
        assert_eq!(settings.action, Action::ForceRelease);
        assert_eq!(settings.lock.marker_ea, "NvLock");
        assert_eq!(settings.lock.lock_timeout, Duration::from_secs(300));
        assert_eq!(settings.lock.max_attempts, 3);
        assert_eq!(settings.lock.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_tenant() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("TENANT_ID"));
        assert!(settings(&[("TENANT_ID", "a"), ("LOCK_MAX_ATTEMPTS", "ten")]).is_err());
    }
}
