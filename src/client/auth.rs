//! Login and registration.

use reqwest::Method;

use super::dto::AuthResponse;
use super::{ApiClient, send_json};
use crate::domain::{LoginCredentials, RegisterCredentials, Session};
use crate::error::ClientError;

impl ApiClient {
    /// Exchanges credentials for a session via `POST /api/auth/login`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] with the server's reason on rejection.
    /// - [`ClientError::MalformedResponse`] if the token or user is missing.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/login")?
            .json(credentials);
        let body: AuthResponse = send_json(request, "Login").await?;
        into_session(body)
    }

    /// Creates an account and signs in via `POST /api/auth/register`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::login`].
    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, "/api/auth/register")?
            .json(credentials);
        let body: AuthResponse = send_json(request, "Registration").await?;
        into_session(body)
    }
}

fn into_session(body: AuthResponse) -> Result<Session, ClientError> {
    match (body.token.filter(|t| !t.is_empty()), body.user) {
        (Some(token), Some(user)) => Ok(Session { token, user }),
        _ => Err(ClientError::MalformedResponse(
            "invalid server response (missing token or user)".to_string(),
        )),
    }
}
