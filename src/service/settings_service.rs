//! Settings service: cached, persisted viewer preferences.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{EventBus, SessionEvent, Settings};
use crate::error::ClientError;
use crate::persistence::LocalStore;

/// Current [`Settings`], loaded once and written through on change.
#[derive(Debug)]
pub struct SettingsService {
    store: LocalStore,
    event_bus: EventBus,
    current: RwLock<Settings>,
}

impl SettingsService {
    /// Creates a service holding default settings until [`Self::load`].
    #[must_use]
    pub fn new(store: LocalStore, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            current: RwLock::new(Settings::default()),
        }
    }

    /// Loads stored settings into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn load(&self) -> Result<Settings, ClientError> {
        let settings = self.store.load_settings().await?;
        *self.current.write().await = settings;
        Ok(settings)
    }

    /// The cached settings.
    pub async fn get(&self) -> Settings {
        *self.current.read().await
    }

    /// Replaces all settings and persists them.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure; the cache is
    /// left unchanged in that case.
    pub async fn replace(&self, settings: Settings) -> Result<Settings, ClientError> {
        let mut current = self.current.write().await;
        self.store.save_settings(&settings).await?;
        *current = settings;
        drop(current);

        let _ = self.event_bus.publish(SessionEvent::SettingsChanged {
            timestamp: Utc::now(),
        });
        tracing::info!(?settings, "settings updated");
        Ok(settings)
    }

    /// Updates one preference by key.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for a bad key or value, or
    /// [`ClientError::Storage`] on database failure.
    pub async fn set(&self, key: &str, value: &str) -> Result<Settings, ClientError> {
        let mut next = self.get().await;
        next.set(key, value)?;
        self.replace(next).await
    }
}
