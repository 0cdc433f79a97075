//! # Cardscope Preference Store
//!
//! This crate is the local persistence layer for user preferences: the
//! watchlist and the price-alert rules. It is deliberately shaped as a
//! key-value blob store - one row per `(user, key)` holding a JSON payload -
//! so the stored shapes can evolve without schema churn.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all persistence-specific
//!   logic behind a small repository API. Nothing else in the application
//!   knows SQL exists.
//! - **Injected Dependency:** The repository is constructed explicitly and
//!   passed where it is needed; it is never reached through an ambient
//!   singleton, and the analytics engine never sees it at all - it only
//!   receives the plain values loaded from here.
//! - **Serialized Writes:** Every read-modify-write cycle (toggling a
//!   watchlist id, adding an alert) happens inside a single repository call,
//!   which serializes a logical session's mutations.
//!
//! ## Public API
//!
//! - `connect`: opens (and creates, if needed) the SQLite database file and
//!   its schema.
//! - `PreferenceRepository`: the high-level data access methods.
//! - `StoreError`: the specific error types that can be returned from this
//!   crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::StoreError;
pub use repository::{PRICE_ALERTS_KEY, PreferenceRepository, WATCHLIST_KEY};
