//! SQLite implementation of the local store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use super::models::{SESSION_KEY, SETTINGS_KEY, StoredEntry};
use crate::domain::{Session, Settings};
use crate::error::ClientError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (\
     key TEXT PRIMARY KEY NOT NULL, \
     value TEXT NOT NULL, \
     updated_at TEXT NOT NULL)";

/// SQLite-backed key/value store using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens (creating if needed) the database at `url` and ensures the
    /// schema exists.
    ///
    /// The pool holds a single long-lived connection so that
    /// `sqlite::memory:` databases survive for the store's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        tracing::debug!(url, "local store opened");
        Ok(Self { pool })
    }

    /// Reads the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn get(&self, key: &str) -> Result<Option<StoredEntry>, ClientError> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT key, value, updated_at FROM kv WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(key, value, updated_at)| StoredEntry {
            key,
            value,
            updated_at,
        }))
    }

    /// Inserts or replaces the entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), ClientError> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes the entry under `key`. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn delete(&self, key: &str) -> Result<bool, ClientError> {
        let result = sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Loads the stored session.
    ///
    /// A stored value that no longer decodes is deleted and reported as
    /// absent, so the viewer is simply signed out.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn load_session(&self) -> Result<Option<Session>, ClientError> {
        let Some(entry) = self.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&entry.value) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable stored session");
                self.delete(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Persists `session`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn save_session(&self, session: &Session) -> Result<(), ClientError> {
        self.put_json(SESSION_KEY, session).await
    }

    /// Removes the stored session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn clear_session(&self) -> Result<(), ClientError> {
        self.delete(SESSION_KEY).await.map(|_| ())
    }

    /// Loads settings, merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn load_settings(&self) -> Result<Settings, ClientError> {
        let Some(entry) = self.get(SETTINGS_KEY).await? else {
            return Ok(Settings::default());
        };
        Ok(serde_json::from_str(&entry.value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "stored settings unreadable, using defaults");
            Settings::default()
        }))
    }

    /// Persists `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on database failure.
    pub async fn save_settings(&self, settings: &Settings) -> Result<(), ClientError> {
        self.put_json(SETTINGS_KEY, settings).await
    }

    async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        let json = serde_json::to_string(value).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.put(key, &json).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DistanceUnit, User, UserId};

    async fn memory_store() -> LocalStore {
        let Ok(store) = LocalStore::connect("sqlite::memory:").await else {
            panic!("failed to open in-memory store");
        };
        store
    }

    fn session() -> Session {
        Session {
            token: "tok".to_string(),
            user: User {
                user_id: UserId::new("u1"),
                email: "a@b.c".to_string(),
                display_name: Some("Ana".to_string()),
                friend_code: None,
                reputation_score: 3,
                created_at: None,
            },
        }
    }

    #[tokio::test]
    async fn session_round_trips_and_clears() {
        let store = memory_store().await;
        let Ok(None) = store.load_session().await else {
            panic!("expected no session");
        };
        let Ok(()) = store.save_session(&session()).await else {
            panic!("save failed");
        };
        let Ok(Some(loaded)) = store.load_session().await else {
            panic!("expected a session");
        };
        assert_eq!(loaded, session());

        let Ok(()) = store.clear_session().await else {
            panic!("clear failed");
        };
        let Ok(None) = store.load_session().await else {
            panic!("expected session cleared");
        };
    }

    #[tokio::test]
    async fn corrupt_session_is_discarded() {
        let store = memory_store().await;
        let Ok(()) = store.put(SESSION_KEY, "{not json").await else {
            panic!("put failed");
        };
        let Ok(None) = store.load_session().await else {
            panic!("expected corrupt session to read as absent");
        };
        let Ok(None) = store.get(SESSION_KEY).await else {
            panic!("expected corrupt session row deleted");
        };
    }

    #[tokio::test]
    async fn settings_default_then_persist() {
        let store = memory_store().await;
        let Ok(initial) = store.load_settings().await else {
            panic!("load failed");
        };
        assert_eq!(initial, Settings::default());

        let updated = Settings {
            distance_unit: DistanceUnit::Km,
            ..Settings::default()
        };
        let Ok(()) = store.save_settings(&updated).await else {
            panic!("save failed");
        };
        let Ok(loaded) = store.load_settings().await else {
            panic!("load failed");
        };
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let store = memory_store().await;
        let (Ok(()), Ok(())) = (store.put("k", "1").await, store.put("k", "2").await) else {
            panic!("put failed");
        };
        let Ok(Some(entry)) = store.get("k").await else {
            panic!("missing entry");
        };
        assert_eq!(entry.value, "2");
        let Ok(true) = store.delete("k").await else {
            panic!("delete should report a removed row");
        };
    }
}
