//! Request and response bodies that exist only on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::{EventId, User};

/// Error body returned by the backend on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a successful login or registration.
///
/// Both fields are optional on the wire so a partial response can be
/// reported as malformed instead of failing to decode.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Authenticated account.
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of `POST /api/checkins`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInRequest<'a> {
    /// Event to check in to.
    pub event_id: &'a EventId,
}

/// Which archived list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivedRole {
    /// Events the viewer created.
    Host,
    /// Events the viewer checked in to.
    Attended,
}

impl ArchivedRole {
    /// Query-string value for `role`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Attended => "attended",
        }
    }
}

/// How the backend answered a check-in submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new record was created.
    Created,
    /// The backend already had a record for this (user, event).
    AlreadyCheckedIn,
}
