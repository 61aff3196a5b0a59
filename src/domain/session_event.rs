//! Notifications emitted after session state changes.
//!
//! Every mutation publishes a [`SessionEvent`] through the
//! [`super::EventBus`]. The auto-refresh task and any front end listen to
//! them to invalidate their cached views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{EventId, MediaId, UserId};

/// Domain notification emitted after a session mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A user signed in or a stored session was restored.
    SignedIn {
        /// The signed-in user.
        user_id: UserId,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// The session was cleared.
    SignedOut {
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// The cached live list is stale and should be refetched.
    EventsInvalidated {
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// The cached archived list is stale and should be refetched.
    ArchivedInvalidated {
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// The live list was refetched.
    EventsRefreshed {
        /// Number of events in the new snapshot.
        count: usize,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// A check-in was recorded.
    CheckedIn {
        /// Event checked in to.
        event_id: EventId,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// The host ended an event.
    EventArchived {
        /// Event ended.
        event_id: EventId,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// Media was added to or removed from an event.
    MediaChanged {
        /// Event whose gallery changed.
        event_id: EventId,
        /// Item added or removed, if known.
        media_id: Option<MediaId>,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },

    /// Settings were updated.
    SettingsChanged {
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns the event id this notification concerns, if any.
    #[must_use]
    pub fn event_id(&self) -> Option<&EventId> {
        match self {
            Self::CheckedIn { event_id, .. }
            | Self::EventArchived { event_id, .. }
            | Self::MediaChanged { event_id, .. } => Some(event_id),
            _ => None,
        }
    }

    /// Returns `true` if the live list should be refetched after this event.
    #[must_use]
    pub const fn invalidates_live(&self) -> bool {
        matches!(
            self,
            Self::EventsInvalidated { .. }
                | Self::CheckedIn { .. }
                | Self::SignedIn { .. }
                | Self::SignedOut { .. }
        )
    }

    /// Returns the notification kind as a static string slice.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::SignedIn { .. } => "signed_in",
            Self::SignedOut { .. } => "signed_out",
            Self::EventsInvalidated { .. } => "events_invalidated",
            Self::ArchivedInvalidated { .. } => "archived_invalidated",
            Self::EventsRefreshed { .. } => "events_refreshed",
            Self::CheckedIn { .. } => "checked_in",
            Self::EventArchived { .. } => "event_archived",
            Self::MediaChanged { .. } => "media_changed",
            Self::SettingsChanged { .. } => "settings_changed",
        }
    }
}
