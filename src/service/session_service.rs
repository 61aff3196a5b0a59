//! Session service: sign-in state shared by every other service.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::client::ApiClient;
use crate::domain::{
    EventBus, LoginCredentials, RegisterCredentials, Session, SessionEvent, User, UserId,
};
use crate::error::ClientError;
use crate::persistence::LocalStore;

/// Holds the current [`Session`] and keeps it in sync with the local store.
///
/// Other services ask it for the bearer token and the viewer id; it never
/// issues requests on their behalf.
#[derive(Debug)]
pub struct SessionService {
    api: ApiClient,
    store: LocalStore,
    event_bus: EventBus,
    current: RwLock<Option<Session>>,
}

impl SessionService {
    /// Creates a signed-out `SessionService`.
    #[must_use]
    pub fn new(api: ApiClient, store: LocalStore, event_bus: EventBus) -> Self {
        Self {
            api,
            store,
            event_bus,
            current: RwLock::new(None),
        }
    }

    /// Restores a previously saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        let Some(session) = self.store.load_session().await? else {
            return Ok(None);
        };
        let user = session.user.clone();
        *self.current.write().await = Some(session);
        tracing::info!(user_id = %user.user_id, "session restored");
        let _ = self.event_bus.publish(SessionEvent::SignedIn {
            user_id: user.user_id.clone(),
            timestamp: Utc::now(),
        });
        Ok(Some(user))
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection, a transport error, or a storage
    /// error if the session cannot be saved.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ClientError> {
        let session = self.api.login(credentials).await?;
        self.establish(session).await
    }

    /// Creates an account and signs in.
    ///
    /// # Errors
    ///
    /// Same as [`SessionService::login`].
    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<User, ClientError> {
        let session = self.api.register(credentials).await?;
        self.establish(session).await
    }

    async fn establish(&self, session: Session) -> Result<User, ClientError> {
        self.store.save_session(&session).await?;
        let user = session.user.clone();
        *self.current.write().await = Some(session);

        let _ = self.event_bus.publish(SessionEvent::SignedIn {
            user_id: user.user_id.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!(user_id = %user.user_id, "signed in");
        Ok(user)
    }

    /// Clears the session locally and on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure; the in-memory
    /// session is cleared regardless.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let previous = self.current.write().await.take();
        let cleared = self.store.clear_session().await;

        let _ = self.event_bus.publish(SessionEvent::SignedOut {
            timestamp: Utc::now(),
        });
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.user_id, "signed out");
        }
        cleared
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    /// The signed-in user's id, if any.
    pub async fn user_id(&self) -> Option<UserId> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.user.user_id.clone())
    }

    /// The bearer token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    /// Returns the bearer token and viewer id, or fails closed.
    ///
    /// `action` completes the sentence "please login to …".
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoginRequired`] when signed out.
    pub async fn require(&self, action: &str) -> Result<(String, UserId), ClientError> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| (s.token.clone(), s.user.user_id.clone()))
            .ok_or_else(|| ClientError::LoginRequired(action.to_string()))
    }
}
