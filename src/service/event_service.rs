//! Event service: live and archived lists plus host-side management.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::{FriendsService, SessionService};
use crate::client::ApiClient;
use crate::client::dto::ArchivedRole;
use crate::domain::{
    ArchivedSet, Coordinates, DecoratedEvent, Event, EventBus, EventCache, EventDraft, EventId,
    FriendsVisibilityPolicy, SessionEvent, ViewerContext, live_events, merge_archived,
};
use crate::error::ClientError;

/// Orchestration layer for event lists and event mutations.
///
/// Every mutation follows the pattern: require a session → check
/// ownership → call the backend → patch the local cache → emit events.
#[derive(Debug)]
pub struct EventService {
    api: ApiClient,
    session: Arc<SessionService>,
    friends: Arc<FriendsService>,
    cache: Arc<EventCache>,
    archived: RwLock<ArchivedSet>,
    event_bus: EventBus,
    policy: FriendsVisibilityPolicy,
    /// Held for the duration of a live-list fetch.
    refresh_lock: Mutex<()>,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: Arc<SessionService>,
        friends: Arc<FriendsService>,
        event_bus: EventBus,
        policy: FriendsVisibilityPolicy,
    ) -> Self {
        Self {
            api,
            session,
            friends,
            cache: Arc::new(EventCache::new()),
            archived: RwLock::new(ArchivedSet::default()),
            event_bus,
            policy,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns a reference to the live [`EventCache`].
    #[must_use]
    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    /// Refetches the live list unless a fetch is already running.
    ///
    /// Returns `Ok(None)` without a request when a refresh is already in
    /// flight, otherwise the number of events fetched. Used by periodic
    /// and bus-triggered refreshes, where the running fetch is as good as
    /// a new one.
    ///
    /// # Errors
    ///
    /// Returns a transport, status, or decode error. The previous snapshot
    /// is kept on failure.
    pub async fn refresh(&self) -> Result<Option<usize>, ClientError> {
        let Ok(_running) = self.refresh_lock.try_lock() else {
            tracing::debug!("refresh already in flight, skipping");
            return Ok(None);
        };
        self.fetch_live().await.map(Some)
    }

    /// Refetches the live list, waiting for any running fetch to finish
    /// first.
    ///
    /// The request is always sent after the call begins, so the snapshot
    /// reflects mutations made before it (a check-in's `checkin_count`).
    ///
    /// # Errors
    ///
    /// Same as [`EventService::refresh`].
    pub async fn refresh_latest(&self) -> Result<usize, ClientError> {
        let _running = self.refresh_lock.lock().await;
        self.fetch_live().await
    }

    async fn fetch_live(&self) -> Result<usize, ClientError> {
        let events = self.api.list_events().await?;
        let count = events.len();
        self.cache.replace(events, Utc::now()).await;

        let _ = self.event_bus.publish(SessionEvent::EventsRefreshed {
            count,
            timestamp: Utc::now(),
        });
        tracing::debug!(count, "live events refreshed");
        Ok(count)
    }

    /// Builds the viewer context from the session and cached friends.
    pub async fn viewer(&self, coords: Option<Coordinates>) -> ViewerContext {
        ViewerContext::anonymous(Utc::now())
            .with_coords(coords)
            .with_user(self.session.user_id().await)
            .with_friends(self.friends.friend_ids().await)
    }

    /// The live list for `viewer`: filtered, ordered, and annotated.
    pub async fn live(&self, viewer: &ViewerContext) -> Vec<DecoratedEvent> {
        live_events(&self.cache.snapshot().await, viewer, self.policy)
    }

    /// Fetches archived events for both roles and merges them.
    ///
    /// A role whose request fails contributes nothing; the failure is
    /// logged and the other role is still used.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::LoginRequired`] when signed out.
    pub async fn refresh_archived(&self) -> Result<ArchivedSet, ClientError> {
        let (token, user_id) = self.session.require("view archived events").await?;
        let (hosted, attended) = tokio::join!(
            self.api.list_archived(&token, ArchivedRole::Host),
            self.api.list_archived(&token, ArchivedRole::Attended),
        );
        let set = merge_archived(
            or_empty(hosted, ArchivedRole::Host),
            or_empty(attended, ArchivedRole::Attended),
        );
        tracing::debug!(%user_id, count = set.events.len(), "archived events refreshed");
        *self.archived.write().await = set.clone();
        Ok(set)
    }

    /// The cached archived set.
    pub async fn archived(&self) -> ArchivedSet {
        self.archived.read().await.clone()
    }

    /// Ids of archived events the viewer attended.
    pub async fn attended_ids(&self) -> HashSet<EventId> {
        self.archived.read().await.attended_ids.clone()
    }

    /// Looks an event up in the live cache, then the archived set.
    pub async fn find(&self, id: &EventId) -> Option<Event> {
        if let Some(event) = self.cache.get(id).await {
            return Some(event);
        }
        self.archived
            .read()
            .await
            .events
            .iter()
            .find(|d| &d.event.id == id)
            .map(|d| d.event.clone())
    }

    /// Looks an event up, refetching both lists once if it is not cached.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] if the event is unknown, or
    /// the error of the live refetch.
    pub async fn resolve(&self, id: &EventId) -> Result<Event, ClientError> {
        if let Some(event) = self.find(id).await {
            return Ok(event);
        }
        self.refresh_latest().await?;
        if self.session.token().await.is_some()
            && let Err(err) = self.refresh_archived().await
        {
            tracing::warn!(error = %err, "archived refetch failed during lookup");
        }
        self.find(id)
            .await
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown event: {id}")))
    }

    /// Creates an event and appends it to the live cache.
    ///
    /// # Errors
    ///
    /// - [`ClientError::LoginRequired`] when signed out.
    /// - [`ClientError::InvalidInput`] when the draft fails validation.
    /// - A transport or server error.
    pub async fn create(&self, draft: EventDraft) -> Result<Event, ClientError> {
        let (token, user_id) = self.session.require("create events").await?;
        let draft = draft.validated()?;
        let event = self.api.create_event(&token, &draft).await?;
        self.cache.upsert(event.clone()).await;

        self.invalidate_live();
        tracing::info!(event_id = %event.id, %user_id, "event created");
        Ok(event)
    }

    /// Updates an event the viewer owns and replaces the cached copy.
    ///
    /// # Errors
    ///
    /// - [`ClientError::LoginRequired`] when signed out.
    /// - [`ClientError::PermissionDenied`] when the viewer is not the owner.
    /// - [`ClientError::InvalidInput`] when the draft fails validation.
    /// - A transport or server error.
    pub async fn update(&self, id: &EventId, draft: EventDraft) -> Result<Event, ClientError> {
        let token = self.require_owner(id, "edit events", "edit").await?;
        let draft = draft.validated()?;
        let event = self.api.update_event(&token, id, &draft).await?;
        self.cache.upsert(event.clone()).await;

        self.invalidate_live();
        tracing::info!(event_id = %id, "event updated");
        Ok(event)
    }

    /// Ends an event the viewer owns. The event leaves the live list and
    /// shows up in the archived list on its next fetch.
    ///
    /// # Errors
    ///
    /// Same as [`EventService::update`], minus validation.
    pub async fn end(&self, id: &EventId) -> Result<(), ClientError> {
        let token = self.require_owner(id, "end events", "end").await?;
        self.api.archive_event(&token, id).await?;
        self.cache.remove(id).await;

        let now = Utc::now();
        let _ = self.event_bus.publish(SessionEvent::EventArchived {
            event_id: id.clone(),
            timestamp: now,
        });
        let _ = self
            .event_bus
            .publish(SessionEvent::ArchivedInvalidated { timestamp: now });
        tracing::info!(event_id = %id, "event ended");
        Ok(())
    }

    /// Deletes an event the viewer owns.
    ///
    /// # Errors
    ///
    /// Same as [`EventService::end`].
    pub async fn delete(&self, id: &EventId) -> Result<(), ClientError> {
        let token = self.require_owner(id, "delete events", "delete").await?;
        self.api.delete_event(&token, id).await?;
        self.cache.remove(id).await;
        {
            let mut archived = self.archived.write().await;
            archived.events.retain(|d| &d.event.id != id);
        }

        self.invalidate_live();
        tracing::info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Drops all cached lists (on sign-out).
    pub async fn clear_archived(&self) {
        *self.archived.write().await = ArchivedSet::default();
    }

    async fn require_owner(
        &self,
        id: &EventId,
        login_action: &str,
        verb: &str,
    ) -> Result<String, ClientError> {
        let (token, user_id) = self.session.require(login_action).await?;
        let event = self.resolve(id).await?;
        if !event.is_hosted_by(&user_id) {
            return Err(ClientError::PermissionDenied(format!(
                "only the host can {verb} this event"
            )));
        }
        Ok(token)
    }

    fn invalidate_live(&self) {
        let _ = self.event_bus.publish(SessionEvent::EventsInvalidated {
            timestamp: Utc::now(),
        });
    }
}

fn or_empty(result: Result<Vec<Event>, ClientError>, role: ArchivedRole) -> Vec<Event> {
    result.unwrap_or_else(|err| {
        tracing::warn!(role = role.as_str(), error = %err, "archived fetch failed");
        Vec::new()
    })
}
