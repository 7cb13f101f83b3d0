use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::{BackendError, FailureKind};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "LEADPIPE_API_URL";
/// Environment variable holding the poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "LEADPIPE_POLL_INTERVAL_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid base url {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("base url must use http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("invalid poll interval {0:?}, expected milliseconds")]
    InvalidPollInterval(String),
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Prefix of every backend route; always ends with `/`.
    pub base_url: Url,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    /// No per-request timeout unless configured; a hanging response stalls its tick.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl ClientSettings {
    /// Reads `LEADPIPE_API_URL` and `LEADPIPE_POLL_INTERVAL_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        if let Some(raw) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            settings = settings.with_base_url(&raw)?;
        }
        if let Some(raw) = lookup(POLL_INTERVAL_ENV).filter(|v| !v.trim().is_empty()) {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| SettingsError::InvalidPollInterval(raw.clone()))?;
            settings = settings.with_poll_interval(Duration::from_millis(millis))?;
        }
        Ok(settings)
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self, SettingsError> {
        let mut url = Url::parse(raw.trim()).map_err(|err| SettingsError::InvalidBaseUrl {
            value: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(url.scheme().to_string()));
        }
        // Url::join replaces the last segment unless the path ends with a slash.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        Ok(self)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, SettingsError> {
        if interval.is_zero() {
            return Err(SettingsError::ZeroPollInterval);
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub(crate) fn endpoint(&self, route: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(route.trim_start_matches('/'))
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}
