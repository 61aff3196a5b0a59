//! In-memory read-through cache of the live event snapshot.
//!
//! [`EventCache`] keeps the last `GET /api/events` response in server
//! order, behind a [`tokio::sync::RwLock`]. Local mutations (create,
//! update, archive, delete) patch the snapshot until the next refetch
//! replaces it wholesale.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::event::Event;
use super::ids::EventId;

#[derive(Debug, Default)]
struct Snapshot {
    events: Vec<Event>,
    fetched_at: Option<DateTime<Utc>>,
}

/// Cached live event list.
///
/// # Concurrency
///
/// - Any number of readers may clone the snapshot concurrently.
/// - Writers (refetch or local patch) are serialized.
#[derive(Debug, Default)]
pub struct EventCache {
    inner: RwLock<Snapshot>,
}

impl EventCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot with a fresh server response.
    pub async fn replace(&self, events: Vec<Event>, fetched_at: DateTime<Utc>) {
        let mut snapshot = self.inner.write().await;
        snapshot.events = events;
        snapshot.fetched_at = Some(fetched_at);
    }

    /// Inserts `event`, or replaces the cached copy with the same id.
    pub async fn upsert(&self, event: Event) {
        let mut snapshot = self.inner.write().await;
        match snapshot.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => snapshot.events.push(event),
        }
    }

    /// Removes the event with `id`, returning it if it was cached.
    pub async fn remove(&self, id: &EventId) -> Option<Event> {
        let mut snapshot = self.inner.write().await;
        let pos = snapshot.events.iter().position(|e| &e.id == id)?;
        Some(snapshot.events.remove(pos))
    }

    /// Returns a copy of the cached event with `id`.
    pub async fn get(&self, id: &EventId) -> Option<Event> {
        self.inner
            .read()
            .await
            .events
            .iter()
            .find(|e| &e.id == id)
            .cloned()
    }

    /// Returns a copy of the whole snapshot, in server order.
    pub async fn snapshot(&self) -> Vec<Event> {
        self.inner.read().await.events.clone()
    }

    /// When the snapshot was last replaced by a fetch.
    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.fetched_at
    }

    /// Drops every cached event.
    pub async fn clear(&self) {
        let mut snapshot = self.inner.write().await;
        snapshot.events.clear();
        snapshot.fetched_at = None;
    }

    /// Returns the number of cached events.
    pub async fn len(&self) -> usize {
        self.inner.read().await.events.len()
    }

    /// Returns `true` if no events are cached.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.events.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_event(id: &str, title: &str) -> Event {
        let Ok(event) = serde_json::from_value::<Event>(serde_json::json!({
            "id": id,
            "title": title,
            "start_time": "2026-03-01T21:00:00Z",
            "created_by": "host",
            "is_active": true,
        })) else {
            panic!("decode failed");
        };
        event
    }

    #[tokio::test]
    async fn replace_and_snapshot_keep_server_order() {
        let cache = EventCache::new();
        assert!(cache.is_empty().await);
        assert!(cache.fetched_at().await.is_none());

        cache
            .replace(vec![make_event("b", "B"), make_event("a", "A")], Utc::now())
            .await;
        let ids: Vec<String> = cache
            .snapshot()
            .await
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(cache.fetched_at().await.is_some());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_and_appends_new() {
        let cache = EventCache::new();
        cache.upsert(make_event("a", "first")).await;
        cache.upsert(make_event("a", "second")).await;
        cache.upsert(make_event("b", "other")).await;

        assert_eq!(cache.len().await, 2);
        let Some(a) = cache.get(&EventId::new("a")).await else {
            panic!("event a missing");
        };
        assert_eq!(a.title, "second");
    }

    #[tokio::test]
    async fn remove_returns_entry_once() {
        let cache = EventCache::new();
        cache.upsert(make_event("a", "A")).await;
        assert!(cache.remove(&EventId::new("a")).await.is_some());
        assert!(cache.remove(&EventId::new("a")).await.is_none());
        assert!(cache.get(&EventId::new("a")).await.is_none());
    }

    #[tokio::test]
    async fn clear_empties_snapshot() {
        let cache = EventCache::new();
        cache.replace(vec![make_event("a", "A")], Utc::now()).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.fetched_at().await.is_none());
    }
}
