//! Startup settings read from the environment.
//!
//! Read once by the host at startup and handed to `Dispatcher::from_settings`;
//! the dispatcher itself never consults the environment.

use url::Url;

use crate::error::ConfigError;
use crate::log::LogLevel;

pub const API_URL_VAR: &str = "API_URL";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Default base URL for calls that do not override it.
    pub api_url: Option<String>,
    pub log_level: LogLevel,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = match read(API_URL_VAR) {
            Some(url) => {
                Url::parse(&url).map_err(|e| ConfigError::InvalidApiUrl {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
                Some(url)
            }
            None => None,
        };

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => level.parse()?,
            None => LogLevel::default(),
        };

        Ok(Self { api_url, log_level })
    }
}
