//! Friends service: the viewer's accepted friends.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::SessionService;
use crate::client::ApiClient;
use crate::domain::{Friend, UserId};
use crate::error::ClientError;

/// Caches the friends list used to evaluate friends-only visibility.
#[derive(Debug)]
pub struct FriendsService {
    api: ApiClient,
    session: Arc<SessionService>,
    friends: RwLock<Vec<Friend>>,
}

impl FriendsService {
    /// Creates a service with an empty friends list.
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<SessionService>) -> Self {
        Self {
            api,
            session,
            friends: RwLock::new(Vec::new()),
        }
    }

    /// Refetches the friends list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoginRequired`] when signed out, otherwise a
    /// transport or server error.
    pub async fn refresh(&self) -> Result<Vec<Friend>, ClientError> {
        let (token, user_id) = self.session.require("view friends").await?;
        let friends = self.api.list_friends(&token).await?;
        tracing::debug!(%user_id, count = friends.len(), "friends refreshed");
        *self.friends.write().await = friends.clone();
        Ok(friends)
    }

    /// The cached friends list.
    pub async fn list(&self) -> Vec<Friend> {
        self.friends.read().await.clone()
    }

    /// User ids of the cached friends.
    pub async fn friend_ids(&self) -> HashSet<UserId> {
        self.friends
            .read()
            .await
            .iter()
            .map(|f| f.user_id.clone())
            .collect()
    }

    /// Drops the cached list (on sign-out).
    pub async fn clear(&self) {
        self.friends.write().await.clear();
    }
}
