//! Service layer: orchestration over the backend and local storage.
//!
//! Each service owns one concern and emits [`SessionEvent`]s through the
//! [`super::domain::EventBus`] after every mutation:
//!
//! - [`SessionService`]: sign-in state and token.
//! - [`SettingsService`]: persisted preferences.
//! - [`FriendsService`]: friend ids for visibility.
//! - [`EventService`]: live and archived lists, host mutations.
//! - [`CheckInService`]: the geofenced check-in flow.
//! - [`MediaService`]: attendance-gated galleries.
//!
//! [`SessionEvent`]: super::domain::SessionEvent

pub mod auto_refresh;
pub mod checkin_service;
pub mod event_service;
pub mod friends_service;
pub mod media_service;
pub mod session_service;
pub mod settings_service;

pub use auto_refresh::spawn_auto_refresh;
pub use checkin_service::CheckInService;
pub use event_service::EventService;
pub use friends_service::FriendsService;
pub use media_service::{Gallery, MediaService};
pub use session_service::SessionService;
pub use settings_service::SettingsService;
