//! # Cardscope Deal Analytics Engine
//!
//! This crate derives every analytic view the application presents: filtered
//! and sorted deal lists, movers above/below market average, price and score
//! distributions, set aggregates, ranked market signals and evaluated price
//! alerts.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Derivation:** The `DealAnalyticsEngine` owns nothing but its
//!   bucket configuration. Every method takes a snapshot slice by reference,
//!   never mutates its inputs and returns freshly built collections, so a
//!   call is safe to repeat and always reproducible.
//!
//! ## Public API
//!
//! - `DealAnalyticsEngine`: the struct that contains the derivation logic.
//! - `FilterCriteria` / `PriceBuckets`: the inputs that shape a derivation.
//! - `Movers`, `MarketDistributions`, `EvaluatedAlert`, ...: the derived
//!   views handed to presentation.
//! - `AnalyticsError`: the specific error types that can be returned from
//!   this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{DealAnalyticsEngine, FilterCriteria, PriceBuckets};
pub use error::AnalyticsError;
pub use report::{
    EvaluatedAlert, MarketDistributions, Movers, PriceBucketCount, RankedItem, ScoreBuckets,
    SetAggregate, SignalLevelCounts,
};
