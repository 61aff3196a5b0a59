//! Check-in service: runs the geofenced check-in flow end to end.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use super::{EventService, SessionService, SettingsService};
use crate::client::ApiClient;
use crate::client::dto::SubmitOutcome;
use crate::domain::{
    Begin, CheckInGuard, CheckInOutcome, CheckInState, Coordinates, Event, EventBus, EventId,
    SessionEvent, authorize_check_in,
};
use crate::error::ClientError;

/// Coordinates [`CheckInGuard`], the local preconditions, and the backend.
#[derive(Debug)]
pub struct CheckInService {
    api: ApiClient,
    session: Arc<SessionService>,
    settings: Arc<SettingsService>,
    events: Arc<EventService>,
    guard: CheckInGuard,
    event_bus: EventBus,
    radius_m: f64,
}

impl CheckInService {
    /// Creates a new `CheckInService` with a fresh guard.
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: Arc<SessionService>,
        settings: Arc<SettingsService>,
        events: Arc<EventService>,
        event_bus: EventBus,
        radius_m: f64,
    ) -> Self {
        Self {
            api,
            session,
            settings,
            events,
            guard: CheckInGuard::new(),
            event_bus,
            radius_m,
        }
    }

    /// Returns a reference to the session's [`CheckInGuard`].
    #[must_use]
    pub fn guard(&self) -> &CheckInGuard {
        &self.guard
    }

    /// Checks the viewer in to `event` from `coords`.
    ///
    /// Steps, in order:
    /// 1. an existing or in-flight check-in returns without side effects;
    /// 2. location, start time, and distance are checked locally;
    /// 3. a session token is required;
    /// 4. the check-in is submitted and, on success, recorded, announced,
    ///    and followed by a live-list refresh.
    ///
    /// # Errors
    ///
    /// - [`ClientError::LocationUnavailable`], [`ClientError::TooEarly`], or
    ///   [`ClientError::TooFar`] when a precondition fails (no request).
    /// - [`ClientError::LoginRequired`] when signed out (no request).
    /// - A transport or server error; the state reverts so the viewer can
    ///   retry.
    pub async fn check_in(
        &self,
        event: &Event,
        coords: Option<Coordinates>,
    ) -> Result<CheckInOutcome, ClientError> {
        if let Some(user_id) = self.session.user_id().await {
            match self.guard.state(&user_id, &event.id) {
                CheckInState::CheckedIn => return Ok(CheckInOutcome::AlreadyCheckedIn),
                CheckInState::Pending => return Ok(CheckInOutcome::InFlight),
                CheckInState::NotCheckedIn => {}
            }
        }

        let unit = self.settings.get().await.distance_unit;
        let distance_km = authorize_check_in(event, coords, Utc::now(), self.radius_m, unit)?;
        let (token, user_id) = self.session.require("check in").await?;

        let ticket = match self.guard.begin(&user_id, &event.id) {
            Begin::Started(ticket) => ticket,
            Begin::InFlight => return Ok(CheckInOutcome::InFlight),
            Begin::AlreadyCheckedIn => return Ok(CheckInOutcome::AlreadyCheckedIn),
        };

        let submitted = self.api.submit_check_in(&token, &event.id).await?;
        ticket.complete();

        let _ = self.event_bus.publish(SessionEvent::CheckedIn {
            event_id: event.id.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(event_id = %event.id, %user_id, distance_km, ?submitted, "checked in");

        if let Err(err) = self.events.refresh_latest().await {
            tracing::warn!(error = %err, "refresh after check-in failed");
        }

        Ok(match submitted {
            SubmitOutcome::Created => CheckInOutcome::CheckedIn,
            SubmitOutcome::AlreadyCheckedIn => CheckInOutcome::AlreadyCheckedIn,
        })
    }

    /// Looks `event_id` up and checks in to it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an unknown event, otherwise
    /// the errors of [`CheckInService::check_in`].
    pub async fn check_in_by_id(
        &self,
        event_id: &EventId,
        coords: Option<Coordinates>,
    ) -> Result<CheckInOutcome, ClientError> {
        let event = self.events.resolve(event_id).await?;
        self.check_in(&event, coords).await
    }

    /// Fetches the viewer's check-ins and seeds the guard with them.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoginRequired`] when signed out, otherwise a
    /// transport or server error.
    pub async fn load_check_ins(&self) -> Result<HashSet<EventId>, ClientError> {
        let (token, user_id) = self.session.require("view your check-ins").await?;
        let records = self.api.list_check_ins(&token).await?;
        let ids: HashSet<EventId> = records.into_iter().map(|r| r.event_id).collect();
        self.guard.seed(&user_id, ids.iter().cloned());
        tracing::debug!(%user_id, count = ids.len(), "check-ins loaded");
        Ok(ids)
    }

    /// State of the viewer's check-in for `event_id`.
    pub async fn state(&self, event_id: &EventId) -> CheckInState {
        match self.session.user_id().await {
            Some(user_id) => self.guard.state(&user_id, event_id),
            None => CheckInState::NotCheckedIn,
        }
    }

    /// Ids of events the viewer is checked in to this session.
    pub async fn checked_in_ids(&self) -> HashSet<EventId> {
        match self.session.user_id().await {
            Some(user_id) => self.guard.checked_in(&user_id),
            None => HashSet::new(),
        }
    }
}
