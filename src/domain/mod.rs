//! Domain layer: records, identifiers, and the three rules engines.
//!
//! - [`lifecycle`] classifies events into live / hidden / archived and
//!   orders the live and archived lists.
//! - [`checkin`] holds the geofenced check-in preconditions and the
//!   per (user, event) check-in state machine.
//! - [`attendance`] decides media permissions on archived events.
//!
//! The remaining modules carry the records these rules operate on, the
//! live event cache, and the session notification bus.

pub mod attendance;
pub mod checkin;
pub mod event;
pub mod event_bus;
pub mod event_cache;
pub mod geo;
pub mod ids;
pub mod lifecycle;
pub mod media;
pub mod session_event;
pub mod settings;
pub mod user;

pub use attendance::{Attendance, AttendanceResolver, MediaPermissions, MediaViewPolicy};
pub use checkin::{
    Begin, CheckInGuard, CheckInOutcome, CheckInRecord, CheckInState, DEFAULT_CHECK_IN_RADIUS_M,
    PendingCheckIn, authorize_check_in,
};
pub use event::{Event, EventDraft, EventPhase, HiddenReason, HostType, Visibility};
pub use event_bus::EventBus;
pub use event_cache::EventCache;
pub use geo::{Coordinates, DistanceUnit, format_distance, haversine_km};
pub use ids::{EventId, FriendshipId, MediaId, UserId};
pub use lifecycle::{
    ArchivedSet, DecoratedEvent, FriendsVisibilityPolicy, ViewerContext, archived_events,
    classify, live_events, merge_archived,
};
pub use media::{EventMedia, MediaType, MediaUpload};
pub use session_event::SessionEvent;
pub use settings::Settings;
pub use user::{Friend, LoginCredentials, RegisterCredentials, Session, User};
