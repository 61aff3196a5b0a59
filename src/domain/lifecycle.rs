//! Event lifecycle classifier.
//!
//! Decides which events a viewer sees in the live list, in which order,
//! and how far away each one is. Everything here is a pure function of
//! its inputs: the same event set, viewer, and `now` always produce the
//! same list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::event::{Event, EventPhase, HiddenReason, Visibility};
use super::geo::{Coordinates, DistanceUnit, format_distance};
use super::ids::{EventId, UserId};
use crate::error::ClientError;

/// How friends-only events created by the viewer are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FriendsVisibilityPolicy {
    /// Only the friend set counts; the viewer's own friends-only events are
    /// hidden unless the viewer appears in their own friend set.
    #[default]
    FriendsOnly,
    /// The viewer always sees their own friends-only events.
    IncludeOwn,
}

impl fmt::Display for FriendsVisibilityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FriendsOnly => "friends_only",
            Self::IncludeOwn => "include_own",
        })
    }
}

impl FromStr for FriendsVisibilityPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friends_only" => Ok(Self::FriendsOnly),
            "include_own" => Ok(Self::IncludeOwn),
            other => Err(ClientError::Config(format!(
                "unknown friends visibility policy: {other}"
            ))),
        }
    }
}

/// Per-request view of who is looking, from where, and when.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerContext {
    /// Current device position, if geolocation is available.
    pub coords: Option<Coordinates>,
    /// Instant the classification is evaluated at.
    pub now: DateTime<Utc>,
    /// Authenticated viewer, if any.
    pub user_id: Option<UserId>,
    /// User ids of the viewer's accepted friends.
    pub friend_ids: HashSet<UserId>,
}

impl ViewerContext {
    /// An anonymous viewer with no location and no friends.
    #[must_use]
    pub fn anonymous(now: DateTime<Utc>) -> Self {
        Self {
            coords: None,
            now,
            user_id: None,
            friend_ids: HashSet::new(),
        }
    }

    /// Sets the viewer's position.
    #[must_use]
    pub fn with_coords(mut self, coords: Option<Coordinates>) -> Self {
        self.coords = coords;
        self
    }

    /// Sets the authenticated viewer.
    #[must_use]
    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the viewer's friend ids.
    #[must_use]
    pub fn with_friends(mut self, friend_ids: impl IntoIterator<Item = UserId>) -> Self {
        self.friend_ids = friend_ids.into_iter().collect();
        self
    }
}

/// An event annotated with its distance from the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedEvent {
    /// The underlying event.
    pub event: Event,
    /// Great-circle distance in kilometres; `None` without viewer coordinates.
    pub distance_km: Option<f64>,
}

impl DecoratedEvent {
    /// Distance rendered in `unit`, if known.
    #[must_use]
    pub fn distance_label(&self, unit: DistanceUnit) -> Option<String> {
        self.distance_km.map(|km| format_distance(km, unit))
    }
}

/// Places an event into exactly one [`EventPhase`] for this viewer.
#[must_use]
pub fn classify(
    event: &Event,
    viewer: &ViewerContext,
    policy: FriendsVisibilityPolicy,
) -> EventPhase {
    if event.is_archived {
        return EventPhase::Archived;
    }
    if !event.is_active {
        return EventPhase::LiveHidden(HiddenReason::Inactive);
    }
    if event.has_ended(viewer.now) {
        return EventPhase::LiveHidden(HiddenReason::Ended);
    }
    if event.visibility == Visibility::Friends && !may_see_friends_only(event, viewer, policy) {
        return EventPhase::LiveHidden(HiddenReason::FriendsOnly);
    }
    EventPhase::LiveVisible
}

fn may_see_friends_only(
    event: &Event,
    viewer: &ViewerContext,
    policy: FriendsVisibilityPolicy,
) -> bool {
    let creator = event.creator_id();
    if viewer.friend_ids.contains(creator) {
        return true;
    }
    policy == FriendsVisibilityPolicy::IncludeOwn && viewer.user_id.as_ref() == Some(creator)
}

/// Filters `events` down to the live list, soonest first.
///
/// Ties on `start_time` keep their input order.
#[must_use]
pub fn live_events(
    events: &[Event],
    viewer: &ViewerContext,
    policy: FriendsVisibilityPolicy,
) -> Vec<DecoratedEvent> {
    let mut live: Vec<DecoratedEvent> = events
        .iter()
        .filter(|e| classify(e, viewer, policy) == EventPhase::LiveVisible)
        .map(|e| DecoratedEvent {
            distance_km: viewer
                .coords
                .map(|here| here.distance_km(&e.coordinates())),
            event: e.clone(),
        })
        .collect();
    live.sort_by_key(|d| d.event.start_time);
    live
}

/// Orders archived events most recently ended first.
///
/// No filtering is applied; events without `archived_at` sort last, and
/// distance is never attached.
#[must_use]
pub fn archived_events(events: Vec<Event>) -> Vec<DecoratedEvent> {
    let mut archived: Vec<DecoratedEvent> = events
        .into_iter()
        .map(|event| DecoratedEvent {
            event,
            distance_km: None,
        })
        .collect();
    archived.sort_by(|a, b| b.event.archived_at.cmp(&a.event.archived_at));
    archived
}

/// Archived events visible to the viewer, merged from both roles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchivedSet {
    /// Hosted and attended events, de-duplicated and ordered.
    pub events: Vec<DecoratedEvent>,
    /// Ids the viewer attended (drives media contribution rights).
    pub attended_ids: HashSet<EventId>,
}

/// Merges the `role=host` and `role=attended` listings.
///
/// When an id appears in both, the hosted copy wins.
#[must_use]
pub fn merge_archived(hosted: Vec<Event>, attended: Vec<Event>) -> ArchivedSet {
    let attended_ids: HashSet<EventId> = attended.iter().map(|e| e.id.clone()).collect();
    let mut seen: HashSet<EventId> = HashSet::with_capacity(hosted.len() + attended.len());
    let merged: Vec<Event> = hosted
        .into_iter()
        .chain(attended)
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    ArchivedSet {
        events: archived_events(merged),
        attended_ids,
    }
}
