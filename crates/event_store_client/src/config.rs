use crate::EventStoreError;
use secrecy::SecretString;

const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<SecretString>,
    pub max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, EventStoreError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, EventStoreError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("EVENT_STORE_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| EventStoreError::Config("EVENT_STORE_BASE_URL missing".into()))?;
        let api_token = get("EVENT_STORE_API_TOKEN")
            .filter(|s| !s.is_empty())
            .map(|t| SecretString::new(t.into()));
        let max_retries = match get("EVENT_STORE_MAX_RETRIES") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                EventStoreError::Config(format!("EVENT_STORE_MAX_RETRIES not a number: {raw}"))
            })?,
            None => DEFAULT_MAX_RETRIES,
        };
        Ok(Self {
            base_url,
            api_token,
            max_retries,
        })
    }
}
