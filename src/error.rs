//! Client error types with stable numeric codes.
//!
//! [`ClientError`] is the central error type for the crate. Precondition
//! rejections are raised locally before any request is built; transport and
//! server failures wrap whatever the backend (or the network) reported.

use chrono::{DateTime, Utc};

/// Client-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category              | Raised                         |
/// |-----------|-----------------------|--------------------------------|
/// | 1000–1999 | Precondition          | Locally, no request issued     |
/// | 2000–2999 | Transport / server    | After a request was attempted  |
/// | 3000–3999 | Local infrastructure  | Storage or configuration       |
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The viewer's current location is not known.
    #[error("location required: enable location services to check in")]
    LocationUnavailable,

    /// The event has not started yet.
    #[error("too early: this event hasn't started yet (starts at {starts_at})")]
    TooEarly {
        /// Official start of the event.
        starts_at: DateTime<Utc>,
    },

    /// The viewer is outside the check-in geofence.
    #[error(
        "too far away: you must be within {radius_m}m of the event to check in. \
         You are currently {formatted} away."
    )]
    TooFar {
        /// Great-circle distance to the event in kilometres.
        distance_km: f64,
        /// Geofence radius in metres.
        radius_m: f64,
        /// Distance rendered in the viewer's preferred unit.
        formatted: String,
    },

    /// The viewer is authenticated but not allowed to perform the action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The action needs a session token and none is present.
    #[error("login required: please login to {0}")]
    LoginRequired(String),

    /// User-provided input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Server-provided `error` field, or a generic fallback.
        message: String,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Local device storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::LocationUnavailable => 1001,
            Self::TooEarly { .. } => 1002,
            Self::TooFar { .. } => 1003,
            Self::PermissionDenied(_) => 1004,
            Self::LoginRequired(_) => 1005,
            Self::InvalidInput(_) => 1006,
            Self::Api { .. } => 2001,
            Self::Transport(_) => 2002,
            Self::MalformedResponse(_) => 2003,
            Self::Storage(_) => 3001,
            Self::Config(_) => 3002,
        }
    }

    /// Returns `true` for rejections detected before any network call.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::LocationUnavailable
                | Self::TooEarly { .. }
                | Self::TooFar { .. }
                | Self::PermissionDenied(_)
                | Self::LoginRequired(_)
                | Self::InvalidInput(_)
        )
    }

    /// Returns `true` when repeating the same action may succeed without
    /// the viewer changing anything (transport and server failures).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Transport(_) | Self::MalformedResponse(_)
        )
    }

    /// Returns the HTTP status for [`ClientError::Api`], if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
