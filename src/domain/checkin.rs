//! Geofenced check-in guard.
//!
//! [`authorize_check_in`] holds the location, start-time, and proximity
//! preconditions. [`CheckInGuard`] tracks the per (user, event) state
//! machine `NotCheckedIn → Pending → CheckedIn` and suppresses concurrent
//! attempts while one is in flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::Event;
use super::geo::{Coordinates, DistanceUnit, format_distance};
use super::ids::{EventId, UserId};
use crate::error::ClientError;

/// Geofence radius around an event, in metres.
pub const DEFAULT_CHECK_IN_RADIUS_M: f64 = 100.0;

/// A stored attendance record returned by `GET /api/checkins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRecord {
    /// Event checked in to.
    pub event_id: EventId,
    /// Attendee, when the backend includes it.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// When the check-in was recorded.
    #[serde(default, alias = "created_at")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Where a (user, event) pair sits in the check-in state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckInState {
    /// No check-in recorded in this session.
    #[default]
    NotCheckedIn,
    /// Authorization and submission are in flight.
    Pending,
    /// Recorded. Never reverts within the session.
    CheckedIn,
}

/// Result of a check-in attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// A new check-in was recorded.
    CheckedIn,
    /// The viewer was already checked in (locally or server-side).
    AlreadyCheckedIn,
    /// Another attempt for the same event is still in flight; nothing sent.
    InFlight,
}

/// Checks the local preconditions for a check-in, in order.
///
/// Returns the distance to the event in kilometres on success.
///
/// # Errors
///
/// - [`ClientError::LocationUnavailable`] when `coords` is `None`.
/// - [`ClientError::TooEarly`] when `now` is before the event start.
/// - [`ClientError::TooFar`] when the viewer is more than `radius_m`
///   metres away; the message carries the distance in `unit`.
pub fn authorize_check_in(
    event: &Event,
    coords: Option<Coordinates>,
    now: DateTime<Utc>,
    radius_m: f64,
    unit: DistanceUnit,
) -> Result<f64, ClientError> {
    let Some(here) = coords else {
        return Err(ClientError::LocationUnavailable);
    };
    if !event.has_started(now) {
        return Err(ClientError::TooEarly {
            starts_at: event.start_time,
        });
    }
    let distance_km = here.distance_km(&event.coordinates());
    if distance_km * 1000.0 > radius_m {
        return Err(ClientError::TooFar {
            distance_km,
            radius_m,
            formatted: format_distance(distance_km, unit),
        });
    }
    Ok(distance_km)
}

type StateMap = HashMap<(UserId, EventId), CheckInState>;

fn lock(states: &Mutex<StateMap>) -> MutexGuard<'_, StateMap> {
    states.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session-local check-in state for every (user, event) pair.
///
/// The map sits behind a `std` mutex that is never held across an
/// `.await`, so [`PendingCheckIn`] can release its slot from `Drop`.
#[derive(Debug, Clone, Default)]
pub struct CheckInGuard {
    states: Arc<Mutex<StateMap>>,
}

/// Outcome of [`CheckInGuard::begin`].
#[derive(Debug)]
pub enum Begin {
    /// The pair moved to `Pending`; the ticket must be completed or dropped.
    Started(PendingCheckIn),
    /// An attempt is already pending.
    InFlight,
    /// The pair is already `CheckedIn`.
    AlreadyCheckedIn,
}

impl CheckInGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the pair.
    #[must_use]
    pub fn state(&self, user: &UserId, event: &EventId) -> CheckInState {
        lock(&self.states)
            .get(&(user.clone(), event.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Moves the pair to `Pending` unless it is already pending or done.
    #[must_use]
    pub fn begin(&self, user: &UserId, event: &EventId) -> Begin {
        let key = (user.clone(), event.clone());
        let mut states = lock(&self.states);
        match states.get(&key).copied().unwrap_or_default() {
            CheckInState::CheckedIn => Begin::AlreadyCheckedIn,
            CheckInState::Pending => Begin::InFlight,
            CheckInState::NotCheckedIn => {
                states.insert(key.clone(), CheckInState::Pending);
                Begin::Started(PendingCheckIn {
                    states: Arc::clone(&self.states),
                    key,
                    completed: false,
                })
            }
        }
    }

    /// Marks every id in `events` as checked in for `user`.
    ///
    /// Used to seed the guard from a "my check-ins" listing. Inserting an
    /// id that is already present is a no-op.
    pub fn seed(&self, user: &UserId, events: impl IntoIterator<Item = EventId>) {
        let mut states = lock(&self.states);
        for event in events {
            states.insert((user.clone(), event), CheckInState::CheckedIn);
        }
    }

    /// Event ids `user` is checked in to.
    #[must_use]
    pub fn checked_in(&self, user: &UserId) -> HashSet<EventId> {
        lock(&self.states)
            .iter()
            .filter(|((u, _), state)| u == user && **state == CheckInState::CheckedIn)
            .map(|((_, e), _)| e.clone())
            .collect()
    }

    /// Returns `true` if any check-in for `user` is pending.
    #[must_use]
    pub fn has_pending(&self, user: &UserId) -> bool {
        lock(&self.states)
            .iter()
            .any(|((u, _), state)| u == user && *state == CheckInState::Pending)
    }
}

/// Ticket for an in-flight check-in.
///
/// [`PendingCheckIn::complete`] moves the pair to `CheckedIn`. Dropping the
/// ticket without completing it returns the pair to `NotCheckedIn` so the
/// attempt can be retried.
#[derive(Debug)]
#[must_use = "dropping the ticket cancels the pending check-in"]
pub struct PendingCheckIn {
    states: Arc<Mutex<StateMap>>,
    key: (UserId, EventId),
    completed: bool,
}

impl PendingCheckIn {
    /// Event this ticket is for.
    #[must_use]
    pub fn event_id(&self) -> &EventId {
        &self.key.1
    }

    /// Records the check-in as done.
    pub fn complete(mut self) {
        lock(&self.states).insert(self.key.clone(), CheckInState::CheckedIn);
        self.completed = true;
    }
}

impl Drop for PendingCheckIn {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut states = lock(&self.states);
        // A concurrent seed may have marked the pair done meanwhile.
        if states.get(&self.key) == Some(&CheckInState::Pending) {
            states.remove(&self.key);
        }
    }
}
