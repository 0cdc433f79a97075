use crate::enums::{AlertDirection, SignalLevel};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One tracked product at a point in time, as delivered by the market API.
///
/// Invariants (enforced once, at the api-client ingestion boundary):
/// `id` is unique within a snapshot, `deal_score` is in [0, 100] and
/// `current_price` is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItem {
    pub id: i64,
    pub name: String,
    /// Product line / edition grouping. Items without one are aggregated
    /// under the "Unknown" bucket.
    pub set: Option<String>,
    pub current_price: Decimal,
    /// Market average for the same product. `None` (or zero) means the
    /// relative deviation is undefined for this item.
    pub market_avg_price: Option<Decimal>,
    /// 0-100, higher is better.
    pub deal_score: u8,
    /// Informational confidence percentage.
    pub confidence: Option<u8>,
}

impl PricedItem {
    /// Relative discount vs the market average, as a fraction
    /// (`1 - current/avg`). Items without a usable average report zero so
    /// they sort mid-pack rather than being excluded.
    pub fn savings_fraction(&self) -> Decimal {
        match self.market_avg_price {
            Some(avg) if !avg.is_zero() => Decimal::ONE - self.current_price / avg,
            _ => Decimal::ZERO,
        }
    }

    /// Signed deviation from the market average as a percentage; negative
    /// means priced below market. `None` when the average is absent or zero.
    pub fn market_delta_pct(&self) -> Option<Decimal> {
        match self.market_avg_price {
            Some(avg) if !avg.is_zero() => {
                Some((self.current_price - avg) / avg * Decimal::ONE_HUNDRED)
            }
            _ => None,
        }
    }
}

/// A discrete market event detected by the upstream analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: i64,
    pub signal_type: String,
    pub signal_level: SignalLevel,
    pub product_name: String,
    pub product_set: Option<String>,
    pub current_price: Option<Decimal>,
    pub deal_score: Option<u8>,
    pub description: Option<String>,
    pub detected_at: DateTime<Utc>,
}

/// A user's watchlist: item-id membership only, no ordering significance.
///
/// Ids that no longer resolve against the current snapshot are silently
/// dropped by the views that consume the watchlist, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    ids: HashSet<i64>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Flips membership for `id` and returns whether the item is watched
    /// after the call.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        self.ids.remove(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &HashSet<i64> {
        &self.ids
    }
}

/// A user-defined price alert rule. Created and deleted by explicit user
/// action only; the triggered state is always recomputed against a live
/// snapshot and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    /// Case-insensitive substring matched against item names.
    pub product_name_pattern: String,
    pub target_price: Decimal,
    pub direction: AlertDirection,
    pub created_at: DateTime<Utc>,
}

impl PriceAlert {
    pub fn new(
        product_name_pattern: impl Into<String>,
        target_price: Decimal,
        direction: AlertDirection,
    ) -> Result<Self, CoreError> {
        let product_name_pattern = product_name_pattern.into();
        if product_name_pattern.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "product_name_pattern".to_string(),
                "must not be empty".to_string(),
            ));
        }
        if target_price < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "target_price".to_string(),
                "must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            product_name_pattern,
            target_price,
            direction,
            created_at: Utc::now(),
        })
    }
}

/// An immutable point-in-time view of the market, fetched as a whole before
/// any analytics run against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub items: Vec<PricedItem>,
    pub signals: Vec<Signal>,
    pub fetched_at: DateTime<Utc>,
}
