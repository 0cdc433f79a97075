use core_types::{PriceAlert, PricedItem, QualityTier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An item ranked by its deviation from the market average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item: PricedItem,
    /// Signed percentage; negative means priced below market.
    pub delta_pct: Decimal,
}

/// Items deviating from their market average, most extreme first on each
/// side. The two lists are disjoint: items exactly at market (or without a
/// usable average) appear in neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movers {
    pub below_average: Vec<RankedItem>,
    pub above_average: Vec<RankedItem>,
}

/// Count of items falling into one configured price range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBucketCount {
    pub lower: Decimal,
    /// `None` for the open-ended top bucket.
    pub upper: Option<Decimal>,
    pub count: usize,
}

impl fmt::Display for PriceBucketCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) if self.lower.is_zero() => write!(f, "under {upper}"),
            Some(upper) => write!(f, "{} - {}", self.lower, upper),
            None => write!(f, "{}+", self.lower),
        }
    }
}

/// Item counts per quality tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBuckets {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub low: usize,
}

impl ScoreBuckets {
    pub fn get(&self, tier: QualityTier) -> usize {
        match tier {
            QualityTier::Excellent => self.excellent,
            QualityTier::Good => self.good,
            QualityTier::Fair => self.fair,
            QualityTier::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.excellent + self.good + self.fair + self.low
    }
}

/// Per-set aggregate over a snapshot. Items without a set are grouped under
/// the "Unknown" sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAggregate {
    pub set: String,
    pub count: usize,
    pub average_score: Decimal,
    pub average_price: Decimal,
}

/// The full statistics view over a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketDistributions {
    pub price_buckets: Vec<PriceBucketCount>,
    pub score_buckets: ScoreBuckets,
    pub average_price: Decimal,
    pub average_score: Decimal,
    /// Sorted by count descending; ties keep first-seen snapshot order.
    pub set_aggregates: Vec<SetAggregate>,
}

/// A price alert together with its recomputed trigger state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedAlert {
    pub alert: PriceAlert,
    pub triggered: bool,
    /// Live price of the first matching item, when one exists.
    pub current_price: Option<Decimal>,
    /// Name of the matched item, for display.
    pub matched_name: Option<String>,
}

/// Signal totals per level, for the summary header of the signals view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalLevelCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}
