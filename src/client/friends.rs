//! Accepted friends.

use reqwest::Method;

use super::{ApiClient, send_json};
use crate::domain::Friend;
use crate::error::ClientError;

impl ApiClient {
    /// Lists the viewer's accepted friends (`GET /api/friends`).
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn list_friends(&self, token: &str) -> Result<Vec<Friend>, ClientError> {
        send_json(
            self.authed(Method::GET, "/api/friends", token)?,
            "Loading friends",
        )
        .await
    }
}
