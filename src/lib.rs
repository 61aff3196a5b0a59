//! # partyfinder
//!
//! Client core for PartyFinder, a service for discovering local social
//! events.
//!
//! The crate is a thin layer over the PartyFinder REST API. Its own
//! business rules are three small engines in [`domain`]:
//!
//! - the event lifecycle classifier (which events a viewer sees, in which
//!   order, how far away),
//! - the geofenced check-in guard (location, start time, 100 m radius, one
//!   attempt in flight per event),
//! - the attendance resolver (who may add media to an ended event).
//!
//! ## Architecture
//!
//! ```text
//! CLI (main.rs)
//!     │
//!     ├── AppState (app_state.rs)
//!     │
//!     ├── Services (service/)
//!     │     Session · Settings · Friends · Events · CheckIns · Media
//!     │     auto-refresh task
//!     │
//!     ├── Rules + records (domain/)      EventBus (domain/)
//!     │
//!     ├── ApiClient (client/)  ── reqwest ──▶  REST backend
//!     │
//!     └── LocalStore (persistence/)  ── sqlx ──▶  SQLite
//! ```

pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
