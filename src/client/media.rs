//! Event media gallery endpoints.

use reqwest::Method;
use reqwest::multipart::{Form, Part};

use super::{ApiClient, send_empty, send_json};
use crate::domain::{EventId, EventMedia, MediaId, MediaUpload};
use crate::error::ClientError;

/// Multipart field the backend reads the file from.
const MEDIA_FIELD: &str = "media";

impl ApiClient {
    /// Lists an event's media (`GET /api/events/{id}/media`). No auth.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error.
    pub async fn list_media(&self, event_id: &EventId) -> Result<Vec<EventMedia>, ClientError> {
        let request = self.request(Method::GET, &format!("/api/events/{event_id}/media"))?;
        send_json(request, "Loading media").await
    }

    /// Uploads one file as multipart field `media`.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error, or a transport error if the
    /// content type is not a valid MIME string.
    pub async fn upload_media(
        &self,
        token: &str,
        event_id: &EventId,
        upload: MediaUpload,
    ) -> Result<(), ClientError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = Form::new().part(MEDIA_FIELD, part);
        let request = self
            .authed(Method::POST, &format!("/api/events/{event_id}/media"), token)?
            .multipart(form);
        send_empty(request, "Upload").await
    }

    /// Deletes one media item.
    ///
    /// # Errors
    ///
    /// Returns a transport or status error.
    pub async fn delete_media(
        &self,
        token: &str,
        event_id: &EventId,
        media_id: &MediaId,
    ) -> Result<(), ClientError> {
        let request = self.authed(
            Method::DELETE,
            &format!("/api/events/{event_id}/media/{media_id}"),
            token,
        )?;
        send_empty(request, "Delete").await
    }
}
