//! Accounts, sessions, and the friends list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{FriendshipId, UserId};

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier.
    pub user_id: UserId,
    /// Login email.
    pub email: String,
    /// Public display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Code others can use to send a friend request.
    #[serde(default)]
    pub friend_code: Option<String>,
    /// Community reputation.
    #[serde(default)]
    pub reputation_score: i64,
    /// Account creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Bearer token plus the user it was issued for.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for the `authorization` header.
    pub token: String,
    /// Signed-in user.
    pub user: User,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Login email.
    pub email: String,
    /// Plain-text password, sent over TLS only.
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Clone, Serialize)]
pub struct RegisterCredentials {
    /// Login email.
    pub email: String,
    /// Plain-text password, sent over TLS only.
    pub password: String,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl std::fmt::Debug for RegisterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// One accepted friendship, seen from the viewer's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    /// The friend's account.
    pub user_id: UserId,
    /// The friend's email.
    pub email: String,
    /// The friend's display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// The friend's reputation.
    #[serde(default)]
    pub reputation_score: i64,
    /// Friendship row identifier.
    pub friendship_id: FriendshipId,
    /// When the friendship was accepted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
