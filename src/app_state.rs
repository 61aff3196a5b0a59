//! Shared application state bundling every service.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::domain::{EventBus, User};
use crate::error::ClientError;
use crate::persistence::LocalStore;
use crate::service::{
    CheckInService, EventService, FriendsService, MediaService, SessionService, SettingsService,
    spawn_auto_refresh,
};

/// Every service of one client session, wired together.
///
/// Cheap to clone; all services are behind [`Arc`].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration the state was built from.
    pub config: Arc<ClientConfig>,
    /// Session notifications.
    pub event_bus: EventBus,
    /// Sign-in state.
    pub session: Arc<SessionService>,
    /// Persisted preferences.
    pub settings: Arc<SettingsService>,
    /// Friends list.
    pub friends: Arc<FriendsService>,
    /// Live and archived events.
    pub events: Arc<EventService>,
    /// Geofenced check-ins.
    pub check_ins: Arc<CheckInService>,
    /// Event galleries.
    pub media: Arc<MediaService>,
}

impl AppState {
    /// Opens the local store and wires the services.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the local store cannot be opened,
    /// or [`ClientError::Transport`] if the HTTP client cannot be built.
    pub async fn build(config: ClientConfig) -> Result<Self, ClientError> {
        let store = LocalStore::connect(&config.local_store_url).await?;
        let api = ApiClient::new(config.api_base_url.as_deref(), config.http_timeout())?;
        Ok(Self::from_parts(config, api, store))
    }

    /// Wires the services around an existing client and store.
    #[must_use]
    pub fn from_parts(config: ClientConfig, api: ApiClient, store: LocalStore) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);

        let session = Arc::new(SessionService::new(
            api.clone(),
            store.clone(),
            event_bus.clone(),
        ));
        let settings = Arc::new(SettingsService::new(store, event_bus.clone()));
        let friends = Arc::new(FriendsService::new(api.clone(), Arc::clone(&session)));
        let events = Arc::new(EventService::new(
            api.clone(),
            Arc::clone(&session),
            Arc::clone(&friends),
            event_bus.clone(),
            config.friends_visibility,
        ));
        let check_ins = Arc::new(CheckInService::new(
            api.clone(),
            Arc::clone(&session),
            Arc::clone(&settings),
            Arc::clone(&events),
            event_bus.clone(),
            config.check_in_radius_m,
        ));
        let media = Arc::new(MediaService::new(
            api,
            Arc::clone(&session),
            Arc::clone(&events),
            Arc::clone(&check_ins),
            event_bus.clone(),
            config.media_view,
        ));

        Self {
            config: Arc::new(config),
            event_bus,
            session,
            settings,
            friends,
            events,
            check_ins,
            media,
        }
    }

    /// Loads settings and restores a saved session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        self.settings.load().await?;
        self.session.restore().await
    }

    /// Signs out and drops per-user caches.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the stored session cannot be
    /// removed.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.friends.clear().await;
        self.events.clear_archived().await;
        self.session.logout().await
    }

    /// Starts the auto-refresh loop; it stops when `shutdown` flips.
    #[must_use]
    pub fn start_auto_refresh(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        spawn_auto_refresh(
            Arc::clone(&self.events),
            Arc::clone(&self.settings),
            self.event_bus.subscribe(),
            self.config.auto_refresh_interval(),
            shutdown,
        )
    }
}
