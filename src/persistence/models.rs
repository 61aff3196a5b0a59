//! Stored rows and the keys they live under.

use chrono::{DateTime, Utc};

/// Key of the serialized [`crate::domain::Session`].
pub const SESSION_KEY: &str = "session";

/// Key of the serialized [`crate::domain::Settings`].
pub const SETTINGS_KEY: &str = "settings";

/// A row from the `kv` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Lookup key.
    pub key: String,
    /// JSON document.
    pub value: String,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}
