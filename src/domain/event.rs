//! Event records as served by the backend, plus the create/update draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::geo::Coordinates;
use super::ids::{EventId, UserId};
use crate::error::ClientError;

/// Who may see an event in the live list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone, including unauthenticated viewers.
    #[default]
    Everyone,
    /// Only friends of the creator.
    Friends,
}

/// Kind of venue hosting the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// Fraternity house.
    Fraternity,
    /// Private house.
    #[default]
    House,
    /// Club or bar.
    Club,
}

/// A single gathering.
///
/// Optional and defaulted fields mirror how the backend omits or nulls
/// columns, so archived payloads with sparse rows still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Venue kind.
    #[serde(default, deserialize_with = "null_as_default")]
    pub host_type: HostType,
    /// Latitude of the venue.
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_lat: f64,
    /// Longitude of the venue.
    #[serde(default, deserialize_with = "null_as_default")]
    pub location_lng: f64,
    /// Official start.
    pub start_time: DateTime<Utc>,
    /// Official end; `None` means open-ended.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Free-form tags.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Party theme.
    #[serde(default)]
    pub theme: Option<String>,
    /// Music genre.
    #[serde(default)]
    pub music_type: Option<String>,
    /// Cover charge as entered by the host.
    #[serde(default)]
    pub cover_charge: Option<String>,
    /// Bring your own bottle.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_byob: bool,
    /// `false` once deleted or deactivated.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    /// Owner of the event.
    pub created_by: UserId,
    /// Legacy owner column; the backend fills it with the creator.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Row creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Number of recorded check-ins.
    #[serde(default)]
    pub checkin_count: Option<u64>,
    /// Visibility rule; unset means everyone.
    #[serde(default, deserialize_with = "null_as_default")]
    pub visibility: Visibility,
    /// `true` once the creator ended the event.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_archived: bool,
    /// When the event was ended.
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Owner of the event: `user_id` when the row carries it, otherwise
    /// `created_by`. Friend visibility and host checks both key on it.
    #[must_use]
    pub fn creator_id(&self) -> &UserId {
        self.user_id.as_ref().unwrap_or(&self.created_by)
    }

    /// Returns `true` when `user` owns this event.
    #[must_use]
    pub fn is_hosted_by(&self, user: &UserId) -> bool {
        self.creator_id() == user
    }

    /// Venue position.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.location_lat,
            longitude: self.location_lng,
        }
    }

    /// Returns `true` when `end_time` is set and not after `now`.
    #[must_use]
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| end <= now)
    }

    /// Returns `true` once `now` has reached the official start.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }
}

/// Why a non-archived event is hidden from the live list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    /// Deactivated by its creator or by moderation.
    Inactive,
    /// `end_time` has passed.
    Ended,
    /// Friends-only event and the viewer is not a friend of the creator.
    FriendsOnly,
}

/// Exactly one of the three lifecycle buckets an event can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Shown in the live list and on the map.
    LiveVisible,
    /// Not archived, but filtered out for this viewer at this instant.
    LiveHidden(HiddenReason),
    /// Explicitly ended by the creator.
    Archived,
}

/// Body of `POST /api/events` and `PUT /api/events/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Display title (required, trimmed).
    pub title: String,
    /// Description; blank becomes `null`.
    pub description: Option<String>,
    /// Venue kind.
    pub host_type: HostType,
    /// Latitude of the venue.
    pub location_lat: f64,
    /// Longitude of the venue.
    pub location_lng: f64,
    /// Official start.
    pub start_time: DateTime<Utc>,
    /// Official end, if any.
    pub end_time: Option<DateTime<Utc>>,
    /// Party theme; blank becomes `null`.
    pub theme: Option<String>,
    /// Music genre; blank becomes `null`.
    pub music_type: Option<String>,
    /// Cover charge; blank becomes `null`.
    pub cover_charge: Option<String>,
    /// Bring your own bottle.
    pub is_byob: bool,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Visibility rule.
    pub visibility: Visibility,
}

impl EventDraft {
    /// Starts a draft with the required fields and defaults elsewhere.
    #[must_use]
    pub fn new(title: impl Into<String>, at: Coordinates, start_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            host_type: HostType::default(),
            location_lat: at.latitude,
            location_lng: at.longitude,
            start_time,
            end_time: None,
            theme: None,
            music_type: None,
            cover_charge: None,
            is_byob: false,
            tags: Vec::new(),
            visibility: Visibility::default(),
        }
    }

    /// Pre-fills a draft from an existing event for editing.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            host_type: event.host_type,
            location_lat: event.location_lat,
            location_lng: event.location_lng,
            start_time: event.start_time,
            end_time: event.end_time,
            theme: event.theme.clone(),
            music_type: event.music_type.clone(),
            cover_charge: event.cover_charge.clone(),
            is_byob: event.is_byob,
            tags: event.tags.clone(),
            visibility: event.visibility,
        }
    }

    /// Trims text fields, nulls blank optionals, and checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] when the title is blank, the
    /// coordinates are invalid, or `end_time` is not after `start_time`.
    pub fn validated(self) -> Result<Self, ClientError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ClientError::InvalidInput("title is required".to_string()));
        }
        Coordinates::new(self.location_lat, self.location_lng)?;
        if let Some(end) = self.end_time
            && end <= self.start_time
        {
            return Err(ClientError::InvalidInput(
                "end time must be after start time".to_string(),
            ));
        }
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Ok(Self {
            title,
            description: blank_to_none(self.description),
            theme: blank_to_none(self.theme),
            music_type: blank_to_none(self.music_type),
            cover_charge: blank_to_none(self.cover_charge),
            tags,
            ..self
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
