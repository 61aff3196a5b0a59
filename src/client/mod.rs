//! REST transport for the PartyFinder backend.
//!
//! [`ApiClient`] wraps a [`reqwest::Client`] and the configured base URL.
//! Endpoint groups live in their own files as `impl ApiClient` blocks:
//!
//! | File           | Endpoints                                    |
//! |----------------|----------------------------------------------|
//! | `auth.rs`      | `POST /api/auth/login`, `/api/auth/register` |
//! | `events.rs`    | `/api/events`, `/api/events/archived`        |
//! | `checkins.rs`  | `/api/checkins`                              |
//! | `media.rs`     | `/api/events/{id}/media`                     |
//! | `friends.rs`   | `GET /api/friends`                           |
//!
//! Every request carries a fresh `x-request-id` header. Non-success
//! responses become [`ClientError::Api`] with the server's `error` field
//! when present.

pub mod auth;
pub mod checkins;
pub mod dto;
pub mod events;
pub mod friends;
pub mod media;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClientError;
use dto::ApiErrorBody;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest slice of a non-JSON error body quoted in a message.
const BODY_SNIPPET_CHARS: usize = 200;

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl ApiClient {
    /// Builds a client for `base_url`.
    ///
    /// A missing base URL is accepted here and reported on the first
    /// request, so local-only commands keep working without one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: Option<&str>, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }

    /// The normalized base URL, if configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn url(&self, path: &str) -> Result<String, ClientError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ClientError::Config("API base URL is not configured".to_string()))?;
        Ok(format!("{base}{path}"))
    }

    /// Starts an anonymous request with a correlation id attached.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %method, path, "api request");
        Ok(self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, request_id.to_string()))
    }

    /// Starts a request carrying the bearer `token`.
    fn authed(
        &self,
        method: Method,
        path: &str,
        token: &str,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(method, path)?.bearer_auth(token))
    }
}

/// Sends `request` and decodes a JSON success body.
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    action: &str,
) -> Result<T, ClientError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(error_from_response(response, action).await);
    }
    Ok(response.json::<T>().await?)
}

/// Sends `request` and discards a success body.
async fn send_empty(request: RequestBuilder, action: &str) -> Result<(), ClientError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(error_from_response(response, action).await);
    }
    Ok(())
}

/// Converts a non-success response into [`ClientError::Api`].
async fn error_from_response(response: Response, action: &str) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body, action);
    tracing::warn!(status, action, %message, "api request failed");
    ClientError::Api { status, message }
}

/// Picks the user-facing message for a failed request.
///
/// A JSON body's `error` field wins. Otherwise the message is
/// `"<action> failed: HTTP <status>"`, followed by the start of the body
/// when it was not JSON.
fn error_message(status: u16, body: &str, action: &str) -> String {
    let fallback = format!("{action} failed: HTTP {status}");
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.filter(|e| !e.is_empty()).unwrap_or(fallback),
        Err(_) if body.trim().is_empty() => fallback,
        Err(_) => {
            let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
            format!("{fallback} (body: {snippet})")
        }
    }
}
