//! Persistence layer: on-device key/value storage.
//!
//! [`LocalStore`] keeps the signed-in session and the viewer's settings in
//! a single SQLite table via `sqlx`. Everything else is refetched from the
//! backend.

pub mod models;
pub mod sqlite;

pub use sqlite::LocalStore;
