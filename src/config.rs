//! Client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                     | Default                              |
//! |------------------------------|--------------------------------------|
//! | `API_BASE_URL`               | unset (network commands fail)        |
//! | `LOCAL_STORE_URL`            | `sqlite://partyfinder.db?mode=rwc`   |
//! | `CHECKIN_RADIUS_METERS`      | `100`                                |
//! | `AUTO_REFRESH_INTERVAL_SECS` | `30`                                 |
//! | `HTTP_TIMEOUT_SECS`          | `0` (no timeout)                     |
//! | `EVENT_BUS_CAPACITY`         | `1024`                               |
//! | `FRIENDS_VISIBILITY_POLICY`  | `friends_only`                       |
//! | `MEDIA_VIEW_POLICY`          | `public`                             |
//! | `LOG_FORMAT`                 | `text` (`json` for structured logs)  |

use std::str::FromStr;
use std::time::Duration;

use crate::domain::{DEFAULT_CHECK_IN_RADIUS_M, FriendsVisibilityPolicy, MediaViewPolicy};
use crate::error::ClientError;

/// Default on-device database.
pub const DEFAULT_LOCAL_STORE_URL: &str = "sqlite://partyfinder.db?mode=rwc";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ClientError::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Top-level client configuration.
///
/// Loaded once at startup via [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_base_url: Option<String>,

    /// `sqlx` connection string for the local store.
    pub local_store_url: String,

    /// Check-in geofence radius in metres.
    pub check_in_radius_m: f64,

    /// Seconds between automatic live-list refreshes.
    pub auto_refresh_interval_secs: u64,

    /// Per-request timeout in seconds (0 = none).
    pub http_timeout_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Whether the viewer's own friends-only events are listed.
    pub friends_visibility: FriendsVisibilityPolicy,

    /// Who may list archived-event media.
    pub media_view: MediaViewPolicy,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            local_store_url: DEFAULT_LOCAL_STORE_URL.to_string(),
            check_in_radius_m: DEFAULT_CHECK_IN_RADIUS_M,
            auto_refresh_interval_secs: 30,
            http_timeout_secs: 0,
            event_bus_capacity: 1024,
            friends_visibility: FriendsVisibilityPolicy::default(),
            media_view: MediaViewPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Numeric values
    /// that do not parse also fall back; policy and format names that do
    /// not parse are rejected. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an unknown policy or log format.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let api_base_url = std::env::var("API_BASE_URL")
            .ok()
            .and_then(|url| normalize_base_url(&url));

        let local_store_url =
            std::env::var("LOCAL_STORE_URL").unwrap_or(defaults.local_store_url);

        let check_in_radius_m = parse_env("CHECKIN_RADIUS_METERS", defaults.check_in_radius_m);
        let auto_refresh_interval_secs =
            parse_env("AUTO_REFRESH_INTERVAL_SECS", defaults.auto_refresh_interval_secs);
        let http_timeout_secs = parse_env("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity);

        let friends_visibility =
            parse_env_strict("FRIENDS_VISIBILITY_POLICY", defaults.friends_visibility)?;
        let media_view = parse_env_strict("MEDIA_VIEW_POLICY", defaults.media_view)?;
        let log_format = parse_env_strict("LOG_FORMAT", defaults.log_format)?;

        Ok(Self {
            api_base_url,
            local_store_url,
            check_in_radius_m,
            auto_refresh_interval_secs,
            http_timeout_secs,
            event_bus_capacity,
            friends_visibility,
            media_view,
            log_format,
        })
    }

    /// Sets the backend base URL, normalizing it.
    #[must_use]
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_base_url(url);
        self
    }

    /// Sets the local store connection string.
    #[must_use]
    pub fn with_local_store_url(mut self, url: impl Into<String>) -> Self {
        self.local_store_url = url.into();
        self
    }

    /// Request timeout, or `None` when disabled.
    #[must_use]
    pub const fn http_timeout(&self) -> Option<Duration> {
        match self.http_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Interval between automatic refreshes (at least one second).
    #[must_use]
    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_interval_secs.max(1))
    }
}

/// Trims whitespace and trailing slashes; empty becomes `None`.
fn normalize_base_url(raw: &str) -> Option<String> {
    let url = raw.trim().trim_end_matches('/');
    (!url.is_empty()).then(|| url.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as `T`, returning `default` when unset
/// and propagating the parse error otherwise.
fn parse_env_strict<T: FromStr<Err = ClientError>>(key: &str, default: T) -> Result<T, ClientError> {
    match std::env::var(key) {
        Ok(value) => value.parse(),
        Err(_) => Ok(default),
    }
}
