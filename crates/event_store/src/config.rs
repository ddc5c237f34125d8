use std::sync::Arc;

use event_store_client::config::Config as ClientConfig;

use crate::dates::{OffsetSource, SystemZone};
use crate::error::{StoreError, StoreResult};

/// Client settings plus the timezone used for date normalization.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub client: ClientConfig,
    /// `None` means the system's local zone.
    pub timezone: Option<chrono_tz::Tz>,
}

impl StoreConfig {
    pub fn from_env() -> StoreResult<Self> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> StoreResult<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client = ClientConfig::from_env_with(&mut get)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let timezone = match get("EVENT_STORE_TIMEZONE").filter(|s| !s.trim().is_empty()) {
            Some(name) => Some(name.trim().parse::<chrono_tz::Tz>().map_err(|_| {
                StoreError::Config(format!("unknown EVENT_STORE_TIMEZONE: {name}"))
            })?),
            None => None,
        };
        Ok(Self { client, timezone })
    }

    pub fn offset_source(&self) -> Arc<dyn OffsetSource> {
        match self.timezone {
            Some(tz) => Arc::new(tz),
            None => Arc::new(SystemZone),
        }
    }
}
