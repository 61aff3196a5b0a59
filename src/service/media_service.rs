//! Media service: gallery access for archived events.

use std::sync::Arc;

use chrono::Utc;

use super::{CheckInService, EventService, SessionService};
use crate::client::ApiClient;
use crate::domain::{
    Attendance, AttendanceResolver, Event, EventBus, EventMedia, MediaId, MediaPermissions,
    MediaUpload, MediaViewPolicy, SessionEvent,
};
use crate::error::ClientError;

/// An opened gallery: what the viewer may do and what is in it.
#[derive(Debug, Clone)]
pub struct Gallery {
    /// The event the gallery belongs to.
    pub event: Event,
    /// Resolved attendance of the viewer.
    pub attendance: Attendance,
    /// Actions available to the viewer.
    pub permissions: MediaPermissions,
    /// Media items; empty for live events or when viewing is not allowed.
    pub media: Vec<EventMedia>,
}

/// Resolves attendance and gates media operations on it.
#[derive(Debug)]
pub struct MediaService {
    api: ApiClient,
    session: Arc<SessionService>,
    events: Arc<EventService>,
    check_ins: Arc<CheckInService>,
    event_bus: EventBus,
    policy: MediaViewPolicy,
}

impl MediaService {
    /// Creates a new `MediaService`.
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: Arc<SessionService>,
        events: Arc<EventService>,
        check_ins: Arc<CheckInService>,
        event_bus: EventBus,
        policy: MediaViewPolicy,
    ) -> Self {
        Self {
            api,
            session,
            events,
            check_ins,
            event_bus,
            policy,
        }
    }

    /// Resolves the viewer's attendance for `event`.
    ///
    /// Known attendance comes from the archived `role=attended` listing and
    /// this session's check-ins. Otherwise, for an archived event and a
    /// signed-in viewer, the viewer's check-ins are fetched and searched
    /// for the event. A failed lookup leaves the viewer unverified.
    pub async fn resolve_attendance(&self, event: &Event) -> AttendanceResolver {
        let viewer = self.session.user_id().await;
        let known = self.events.attended_ids().await.contains(&event.id)
            || self.check_ins.checked_in_ids().await.contains(&event.id);
        let mut resolver = AttendanceResolver::new(event, viewer.as_ref(), known);

        if resolver.needs_verification() && self.session.token().await.is_some() {
            resolver.begin_verification();
            match self.check_ins.load_check_ins().await {
                Ok(ids) => resolver.resolve(ids.contains(&event.id)),
                Err(err) => {
                    tracing::warn!(event_id = %event.id, error = %err, "attendance lookup failed");
                    resolver.fail();
                }
            }
        }
        resolver
    }

    /// Opens the gallery of `event`.
    ///
    /// # Errors
    ///
    /// Returns a transport or server error if the media list cannot be
    /// fetched.
    pub async fn open_gallery(&self, event: &Event) -> Result<Gallery, ClientError> {
        let resolver = self.resolve_attendance(event).await;
        let has_token = self.session.token().await.is_some();
        let permissions = resolver.permissions(has_token, self.policy);

        let media = if event.is_archived && permissions.can_view {
            self.api.list_media(&event.id).await?
        } else {
            Vec::new()
        };

        Ok(Gallery {
            event: event.clone(),
            attendance: resolver.attendance(),
            permissions,
            media,
        })
    }

    /// Uploads `upload` to the gallery of `event`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::LoginRequired`] when signed out (no request).
    /// - [`ClientError::PermissionDenied`] when the viewer is neither the
    ///   host nor a verified attendee, or the event is still live.
    /// - A transport or server error.
    pub async fn upload(&self, event: &Event, upload: MediaUpload) -> Result<(), ClientError> {
        let (token, user_id) = self.session.require("upload media").await?;
        let resolver = self.resolve_attendance(event).await;
        if !resolver.permissions(true, self.policy).can_contribute {
            return Err(ClientError::PermissionDenied(
                "only the host or verified attendees can add media to an ended event".to_string(),
            ));
        }

        let file_name = upload.file_name.clone();
        self.api.upload_media(&token, &event.id, upload).await?;

        let _ = self.event_bus.publish(SessionEvent::MediaChanged {
            event_id: event.id.clone(),
            media_id: None,
            timestamp: Utc::now(),
        });
        tracing::info!(event_id = %event.id, %user_id, %file_name, "media uploaded");
        Ok(())
    }

    /// Deletes a media item. Host only.
    ///
    /// # Errors
    ///
    /// - [`ClientError::LoginRequired`] when signed out (no request).
    /// - [`ClientError::PermissionDenied`] when the viewer is not the host.
    /// - A transport or server error.
    pub async fn delete(&self, event: &Event, media_id: &MediaId) -> Result<(), ClientError> {
        let (token, user_id) = self.session.require("delete media").await?;
        let resolver = AttendanceResolver::new(event, Some(&user_id), false);
        if !resolver.permissions(true, self.policy).can_delete {
            return Err(ClientError::PermissionDenied(
                "only the host can delete media".to_string(),
            ));
        }

        self.api.delete_media(&token, &event.id, media_id).await?;

        let _ = self.event_bus.publish(SessionEvent::MediaChanged {
            event_id: event.id.clone(),
            media_id: Some(media_id.clone()),
            timestamp: Utc::now(),
        });
        tracing::info!(event_id = %event.id, %media_id, "media deleted");
        Ok(())
    }
}
