//! Attendance and media authorization for archived events.
//!
//! Hosts may always view and contribute. Anyone else contributes only
//! after their attendance has been confirmed, either from an already
//! loaded list or by an on-demand lookup. Until that lookup resolves,
//! contribution stays disallowed.

use std::fmt;
use std::str::FromStr;

use super::event::Event;
use super::ids::UserId;
use crate::error::ClientError;

/// Who may list media of an archived event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaViewPolicy {
    /// Anyone may list media.
    #[default]
    Public,
    /// Only the host and verified attendees may list media.
    HostOrAttendee,
}

impl fmt::Display for MediaViewPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::HostOrAttendee => "host_or_attendee",
        })
    }
}

impl FromStr for MediaViewPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "host_or_attendee" => Ok(Self::HostOrAttendee),
            other => Err(ClientError::Config(format!(
                "unknown media view policy: {other}"
            ))),
        }
    }
}

/// What is known about the viewer's relationship to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attendance {
    /// The viewer created the event.
    Host,
    /// A check-in by the viewer is on record.
    Attendee,
    /// A lookup is in flight.
    Verifying,
    /// Nothing known yet and no lookup has run.
    Unverified,
    /// A lookup found no check-in.
    NotAttendee,
}

/// Media actions the viewer may take on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaPermissions {
    /// May list media.
    pub can_view: bool,
    /// May upload media.
    pub can_contribute: bool,
    /// May delete media items.
    pub can_delete: bool,
}

/// Per (viewer, event) attendance state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceResolver {
    is_archived: bool,
    attendance: Attendance,
}

impl AttendanceResolver {
    /// Builds the resolver for `viewer` looking at `event`.
    ///
    /// `known_attendee` carries attendance already derived from a loaded
    /// list (archived `role=attended`, or this session's check-ins).
    #[must_use]
    pub fn new(event: &Event, viewer: Option<&UserId>, known_attendee: bool) -> Self {
        let attendance = match viewer {
            Some(user) if event.is_hosted_by(user) => Attendance::Host,
            Some(_) if known_attendee => Attendance::Attendee,
            _ => Attendance::Unverified,
        };
        Self {
            is_archived: event.is_archived,
            attendance,
        }
    }

    /// Current attendance state.
    #[must_use]
    pub const fn attendance(&self) -> Attendance {
        self.attendance
    }

    /// Returns `true` if the viewer created the event.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(self.attendance, Attendance::Host)
    }

    /// Returns `true` if a lookup should run before contribution is decided.
    #[must_use]
    pub const fn needs_verification(&self) -> bool {
        self.is_archived && matches!(self.attendance, Attendance::Unverified)
    }

    /// Marks the lookup as in flight.
    pub fn begin_verification(&mut self) {
        if matches!(self.attendance, Attendance::Unverified) {
            self.attendance = Attendance::Verifying;
        }
    }

    /// Applies the lookup result.
    pub fn resolve(&mut self, found: bool) {
        if matches!(
            self.attendance,
            Attendance::Verifying | Attendance::Unverified
        ) {
            self.attendance = if found {
                Attendance::Attendee
            } else {
                Attendance::NotAttendee
            };
        }
    }

    /// Abandons a failed lookup; contribution stays disallowed.
    pub fn fail(&mut self) {
        if matches!(self.attendance, Attendance::Verifying) {
            self.attendance = Attendance::Unverified;
        }
    }

    /// Media permissions for the current state.
    #[must_use]
    pub fn permissions(&self, has_token: bool, policy: MediaViewPolicy) -> MediaPermissions {
        let is_host = self.is_host();
        let is_attendee = matches!(self.attendance, Attendance::Attendee);
        let can_view = match policy {
            MediaViewPolicy::Public => true,
            MediaViewPolicy::HostOrAttendee => is_host || is_attendee,
        };
        MediaPermissions {
            can_view,
            can_contribute: (is_host || is_attendee) && has_token && self.is_archived,
            can_delete: is_host && has_token,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn archived_event(host: &str) -> Event {
        let Ok(event) = serde_json::from_value::<Event>(serde_json::json!({
            "id": "evt",
            "title": "Last night",
            "start_time": "2026-01-01T20:00:00Z",
            "created_by": host,
            "is_archived": true,
            "archived_at": "2026-01-02T03:00:00Z",
        })) else {
            panic!("decode failed");
        };
        event
    }

    #[test]
    fn host_always_contributes_without_lookup() {
        let event = archived_event("host");
        let resolver = AttendanceResolver::new(&event, Some(&UserId::new("host")), false);
        assert!(resolver.is_host());
        assert!(!resolver.needs_verification());
        let perms = resolver.permissions(true, MediaViewPolicy::HostOrAttendee);
        assert!(perms.can_view);
        assert!(perms.can_contribute);
        assert!(perms.can_delete);
    }

    #[test]
    fn host_is_the_same_owner_the_classifier_sees() {
        let mut event = archived_event("u1");
        event.user_id = Some(UserId::new("u2"));
        let owner = AttendanceResolver::new(&event, Some(event.creator_id()), false);
        assert!(owner.is_host());
        let other = AttendanceResolver::new(&event, Some(&UserId::new("u1")), false);
        assert!(!other.is_host());
        assert!(!other.permissions(true, MediaViewPolicy::Public).can_delete);
    }

    #[test]
    fn stranger_is_denied_until_verification_confirms() {
        let event = archived_event("host");
        let mut resolver = AttendanceResolver::new(&event, Some(&UserId::new("guest")), false);
        assert!(resolver.needs_verification());
        assert!(!resolver.permissions(true, MediaViewPolicy::Public).can_contribute);

        resolver.begin_verification();
        assert_eq!(resolver.attendance(), Attendance::Verifying);
        assert!(!resolver.permissions(true, MediaViewPolicy::Public).can_contribute);

        resolver.resolve(true);
        assert_eq!(resolver.attendance(), Attendance::Attendee);
        let perms = resolver.permissions(true, MediaViewPolicy::Public);
        assert!(perms.can_contribute);
        assert!(!perms.can_delete);
    }

    #[test]
    fn negative_lookup_denies() {
        let event = archived_event("host");
        let mut resolver = AttendanceResolver::new(&event, Some(&UserId::new("guest")), false);
        resolver.begin_verification();
        resolver.resolve(false);
        assert_eq!(resolver.attendance(), Attendance::NotAttendee);
        assert!(!resolver.needs_verification());
        assert!(!resolver.permissions(true, MediaViewPolicy::Public).can_contribute);
    }

    #[test]
    fn failed_lookup_stays_closed() {
        let event = archived_event("host");
        let mut resolver = AttendanceResolver::new(&event, Some(&UserId::new("guest")), false);
        resolver.begin_verification();
        resolver.fail();
        assert_eq!(resolver.attendance(), Attendance::Unverified);
        assert!(!resolver.permissions(true, MediaViewPolicy::Public).can_contribute);
    }

    #[test]
    fn known_attendee_needs_no_lookup() {
        let event = archived_event("host");
        let resolver = AttendanceResolver::new(&event, Some(&UserId::new("guest")), true);
        assert!(!resolver.needs_verification());
        assert!(resolver.permissions(true, MediaViewPolicy::Public).can_contribute);
    }

    #[test]
    fn contribution_requires_token() {
        let event = archived_event("host");
        let resolver = AttendanceResolver::new(&event, Some(&UserId::new("host")), false);
        let perms = resolver.permissions(false, MediaViewPolicy::Public);
        assert!(!perms.can_contribute);
        assert!(!perms.can_delete);
    }

    #[test]
    fn live_events_never_accept_contributions() {
        let mut event = archived_event("host");
        event.is_archived = false;
        let resolver = AttendanceResolver::new(&event, Some(&UserId::new("host")), true);
        assert!(!resolver.permissions(true, MediaViewPolicy::Public).can_contribute);
        assert!(!resolver.needs_verification());
    }

    #[test]
    fn view_policy_gates_anonymous_viewers() {
        let event = archived_event("host");
        let resolver = AttendanceResolver::new(&event, None, false);
        assert!(resolver.permissions(false, MediaViewPolicy::Public).can_view);
        assert!(!resolver.permissions(false, MediaViewPolicy::HostOrAttendee).can_view);
    }
}
