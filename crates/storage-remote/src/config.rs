//! Connection settings for the hosted backend.

use std::time::Duration;

use goalpath_core::errors::{Error, Result};

pub const SUPABASE_URL_VAR: &str = "GOALPATH_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_VAR: &str = "GOALPATH_SUPABASE_ANON_KEY";
pub const GOALS_TABLE_VAR: &str = "GOALPATH_GOALS_TABLE";
pub const REQUEST_TIMEOUT_VAR: &str = "GOALPATH_REQUEST_TIMEOUT_MS";

/// Table holding the goal rows.
pub const DEFAULT_GOALS_TABLE: &str = "learning_goals";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    /// Project URL, e.g. `https://abcd.supabase.co` (no trailing slash).
    pub base_url: String,
    /// Publishable (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
    pub goals_table: String,
    pub request_timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            goals_table: DEFAULT_GOALS_TABLE.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Loads settings from the process environment, reading a `.env` file
    /// first when one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url =
            read(SUPABASE_URL_VAR).ok_or_else(|| Error::MissingConfigKey(SUPABASE_URL_VAR.into()))?;
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(Error::InvalidConfigValue(format!(
                "{} must be an http(s) URL, got '{}'",
                SUPABASE_URL_VAR, base_url
            )));
        }
        let anon_key = read(SUPABASE_ANON_KEY_VAR)
            .ok_or_else(|| Error::MissingConfigKey(SUPABASE_ANON_KEY_VAR.into()))?;

        let mut config = Self::new(&base_url, &anon_key);

        if let Some(table) = read(GOALS_TABLE_VAR) {
            config.goals_table = table;
        }

        if let Some(raw) = read(REQUEST_TIMEOUT_VAR) {
            let timeout_ms: u64 = raw.parse().map_err(|_| {
                Error::InvalidConfigValue(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    REQUEST_TIMEOUT_VAR, raw
                ))
            })?;
            config.request_timeout = Duration::from_millis(timeout_ms);
        }

        Ok(config)
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }
}
