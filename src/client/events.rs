//! Event listing and host-side event management.

use reqwest::Method;

use super::dto::ArchivedRole;
use super::{ApiClient, send_empty, send_json};
use crate::domain::{Event, EventDraft, EventId};
use crate::error::ClientError;

impl ApiClient {
    /// Fetches every non-archived event (`GET /api/events`).
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        send_json(self.request(Method::GET, "/api/events")?, "Loading events").await
    }

    /// Fetches archived events the viewer hosted or attended.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn list_archived(
        &self,
        token: &str,
        role: ArchivedRole,
    ) -> Result<Vec<Event>, ClientError> {
        let request = self
            .authed(Method::GET, "/api/events/archived", token)?
            .query(&[("role", role.as_str())]);
        send_json(request, "Loading archived events").await
    }

    /// Creates an event and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn create_event(&self, token: &str, draft: &EventDraft) -> Result<Event, ClientError> {
        let request = self.authed(Method::POST, "/api/events", token)?.json(draft);
        send_json(request, "Creating event").await
    }

    /// Replaces an event's editable fields and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn update_event(
        &self,
        token: &str,
        id: &EventId,
        draft: &EventDraft,
    ) -> Result<Event, ClientError> {
        let request = self
            .authed(Method::PUT, &format!("/api/events/{id}"), token)?
            .json(draft);
        send_json(request, "Updating event").await
    }

    /// Ends (archives) an event. One-way.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn archive_event(&self, token: &str, id: &EventId) -> Result<(), ClientError> {
        let request = self.authed(Method::POST, &format!("/api/events/{id}/archive"), token)?;
        send_empty(request, "Ending event").await
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn delete_event(&self, token: &str, id: &EventId) -> Result<(), ClientError> {
        let request = self.authed(Method::DELETE, &format!("/api/events/{id}"), token)?;
        send_empty(request, "Deleting event").await
    }
}
