use crate::error::AnalyticsError;
use crate::report::{
    EvaluatedAlert, MarketDistributions, Movers, PriceBucketCount, RankedItem, ScoreBuckets,
    SetAggregate, SignalLevelCounts,
};
use core_types::{AlertDirection, PriceAlert, PricedItem, QualityTier, Signal, SignalLevel, SortKey};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// Grouping label for items that carry no set.
pub const UNKNOWN_SET: &str = "Unknown";

/// Ordered, non-overlapping price ranges used for histogram statistics.
///
/// The edges `[e1, .., en]` partition the non-negative price axis into
/// `[0, e1), [e1, e2), .., [en, inf)`. Edges come from configuration, not
/// from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBuckets {
    edges: Vec<Decimal>,
}

impl PriceBuckets {
    /// Validates that the edges are positive and strictly ascending. An
    /// empty edge list is a single catch-all bucket.
    pub fn new(edges: Vec<Decimal>) -> Result<Self, AnalyticsError> {
        if edges.iter().any(|e| *e <= Decimal::ZERO) {
            return Err(AnalyticsError::InvalidBucketEdges(
                "edges must be positive".to_string(),
            ));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalyticsError::InvalidBucketEdges(
                "edges must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { edges })
    }

    /// Index of the single bucket containing `price`.
    fn index_of(&self, price: Decimal) -> usize {
        self.edges
            .iter()
            .position(|edge| price < *edge)
            .unwrap_or(self.edges.len())
    }

    fn bucket_count(&self) -> usize {
        self.edges.len() + 1
    }

    fn bounds(&self, index: usize) -> (Decimal, Option<Decimal>) {
        let lower = if index == 0 {
            Decimal::ZERO
        } else {
            self.edges[index - 1]
        };
        (lower, self.edges.get(index).copied())
    }
}

/// The criteria a deal list is narrowed by. All bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against item name and set.
    /// Empty means "match everything".
    pub search: String,
    pub min_score: u8,
    pub max_score: u8,
    pub min_price: Decimal,
    pub max_price: Decimal,
    /// Membership restriction applied before any other filter (the
    /// watchlist view). Ids missing from the snapshot are dropped silently.
    pub restrict_to: Option<HashSet<i64>>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search: String::new(),
            min_score: 0,
            max_score: 100,
            min_price: Decimal::ZERO,
            max_price: Decimal::MAX,
            restrict_to: None,
        }
    }
}

impl FilterCriteria {
    fn matches(&self, item: &PricedItem) -> bool {
        if let Some(ids) = &self.restrict_to {
            if !ids.contains(&item.id) {
                return false;
            }
        }

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_name = item.name.to_lowercase().contains(&needle);
            let in_set = item
                .set
                .as_deref()
                .is_some_and(|set| set.to_lowercase().contains(&needle));
            if !in_name && !in_set {
                return false;
            }
        }

        item.deal_score >= self.min_score
            && item.deal_score <= self.max_score
            && item.current_price >= self.min_price
            && item.current_price <= self.max_price
    }
}

/// A stateless derivation engine over market snapshots.
///
/// Every method is pure: inputs are read-only, outputs are freshly built,
/// and repeated calls on unchanged input produce identical results (all
/// sorts are stable).
#[derive(Debug, Clone)]
pub struct DealAnalyticsEngine {
    buckets: PriceBuckets,
}

impl DealAnalyticsEngine {
    pub fn new(buckets: PriceBuckets) -> Self {
        Self { buckets }
    }

    /// Narrows `items` by `criteria`, then orders the survivors by `sort`.
    /// `None` (the lenient-parse fallback for unknown sort keys) keeps the
    /// snapshot order.
    pub fn filter_and_sort(
        &self,
        items: &[PricedItem],
        criteria: &FilterCriteria,
        sort: Option<SortKey>,
    ) -> Vec<PricedItem> {
        let mut filtered: Vec<PricedItem> = items
            .iter()
            .filter(|item| criteria.matches(item))
            .cloned()
            .collect();

        match sort {
            Some(SortKey::ScoreDesc) => {
                filtered.sort_by(|a, b| b.deal_score.cmp(&a.deal_score));
            }
            Some(SortKey::PriceAsc) => {
                filtered.sort_by(|a, b| a.current_price.cmp(&b.current_price));
            }
            Some(SortKey::PriceDesc) => {
                filtered.sort_by(|a, b| b.current_price.cmp(&a.current_price));
            }
            Some(SortKey::SavingsDesc) => {
                filtered.sort_by(|a, b| b.savings_fraction().cmp(&a.savings_fraction()));
            }
            None => {}
        }

        tracing::debug!(
            total = items.len(),
            kept = filtered.len(),
            "filtered deal list"
        );
        filtered
    }

    /// Splits the snapshot into items priced below and above their market
    /// average, most extreme deviation first on each side.
    ///
    /// Items without a usable average are excluded, and so are items exactly
    /// at market (`delta == 0`) - strict inequality on both sides keeps the
    /// two lists disjoint.
    pub fn compute_movers(&self, items: &[PricedItem]) -> Movers {
        let mut below_average = Vec::new();
        let mut above_average = Vec::new();

        for item in items {
            let Some(delta_pct) = item.market_delta_pct() else {
                continue;
            };
            let ranked = RankedItem {
                item: item.clone(),
                delta_pct,
            };
            if delta_pct < Decimal::ZERO {
                below_average.push(ranked);
            } else if delta_pct > Decimal::ZERO {
                above_average.push(ranked);
            }
        }

        below_average.sort_by(|a, b| a.delta_pct.cmp(&b.delta_pct));
        above_average.sort_by(|a, b| b.delta_pct.cmp(&a.delta_pct));

        Movers {
            below_average,
            above_average,
        }
    }

    /// Computes the full statistics view: price/score histograms, overall
    /// averages and per-set aggregates. Every derived quantity degrades to
    /// zero on empty input; nothing here can fail.
    pub fn compute_distributions(&self, items: &[PricedItem]) -> MarketDistributions {
        let mut price_counts = vec![0usize; self.buckets.bucket_count()];
        let mut score_buckets = ScoreBuckets::default();
        let mut price_sum = Decimal::ZERO;
        let mut score_sum: u64 = 0;

        // Per-set accumulators in first-seen order, so the count sort below
        // can break ties deterministically.
        let mut set_order: Vec<SetAccumulator> = Vec::new();
        let mut set_index: HashMap<String, usize> = HashMap::new();

        for item in items {
            price_counts[self.buckets.index_of(item.current_price)] += 1;

            match QualityTier::of(item.deal_score) {
                QualityTier::Excellent => score_buckets.excellent += 1,
                QualityTier::Good => score_buckets.good += 1,
                QualityTier::Fair => score_buckets.fair += 1,
                QualityTier::Low => score_buckets.low += 1,
            }

            price_sum += item.current_price;
            score_sum += u64::from(item.deal_score);

            let set_name = item.set.as_deref().unwrap_or(UNKNOWN_SET);
            let slot = match set_index.get(set_name) {
                Some(&i) => i,
                None => {
                    set_index.insert(set_name.to_string(), set_order.len());
                    set_order.push(SetAccumulator::new(set_name));
                    set_order.len() - 1
                }
            };
            set_order[slot].add(item);
        }

        let count = items.len();
        let (average_price, average_score) = if count == 0 {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                price_sum / Decimal::from(count),
                Decimal::from(score_sum) / Decimal::from(count),
            )
        };

        let price_buckets = price_counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| {
                let (lower, upper) = self.buckets.bounds(i);
                PriceBucketCount {
                    lower,
                    upper,
                    count,
                }
            })
            .collect();

        let mut set_aggregates: Vec<SetAggregate> =
            set_order.into_iter().map(SetAccumulator::finish).collect();
        set_aggregates.sort_by(|a, b| b.count.cmp(&a.count));

        MarketDistributions {
            price_buckets,
            score_buckets,
            average_price,
            average_score,
            set_aggregates,
        }
    }

    /// Recomputes the trigger state of every alert against the snapshot.
    ///
    /// Matching is the first item in snapshot order whose name contains the
    /// pattern case-insensitively. An unmatched alert evaluates to
    /// `triggered = false` with no price attached. Alert definitions are
    /// never mutated; trigger state is derived on every call.
    pub fn evaluate_alerts(
        &self,
        alerts: &[PriceAlert],
        items: &[PricedItem],
    ) -> Vec<EvaluatedAlert> {
        alerts
            .iter()
            .map(|alert| {
                let pattern = alert.product_name_pattern.to_lowercase();
                let matched = items
                    .iter()
                    .find(|item| item.name.to_lowercase().contains(&pattern));

                match matched {
                    Some(item) => {
                        let triggered = match alert.direction {
                            AlertDirection::Below => item.current_price <= alert.target_price,
                            AlertDirection::Above => item.current_price >= alert.target_price,
                        };
                        EvaluatedAlert {
                            alert: alert.clone(),
                            triggered,
                            current_price: Some(item.current_price),
                            matched_name: Some(item.name.clone()),
                        }
                    }
                    None => EvaluatedAlert {
                        alert: alert.clone(),
                        triggered: false,
                        current_price: None,
                        matched_name: None,
                    },
                }
            })
            .collect()
    }

    /// Keeps the signals matching the optional level and type filters.
    pub fn filter_signals(
        &self,
        signals: &[Signal],
        level: Option<SignalLevel>,
        signal_type: Option<&str>,
    ) -> Vec<Signal> {
        signals
            .iter()
            .filter(|signal| level.is_none_or(|l| signal.signal_level == l))
            .filter(|signal| signal_type.is_none_or(|t| signal.signal_type == t))
            .cloned()
            .collect()
    }

    /// Orders signals by level priority (high first), then most recently
    /// detected first.
    pub fn rank_signals(&self, signals: &[Signal]) -> Vec<Signal> {
        let mut ranked = signals.to_vec();
        ranked.sort_by(|a, b| {
            b.signal_level
                .cmp(&a.signal_level)
                .then_with(|| b.detected_at.cmp(&a.detected_at))
        });
        ranked
    }

    /// Signal totals per level, for the signals view summary.
    pub fn level_counts(&self, signals: &[Signal]) -> SignalLevelCounts {
        let mut counts = SignalLevelCounts::default();
        for signal in signals {
            match signal.signal_level {
                SignalLevel::High => counts.high += 1,
                SignalLevel::Medium => counts.medium += 1,
                SignalLevel::Low => counts.low += 1,
            }
        }
        counts
    }
}

struct SetAccumulator {
    set: String,
    count: usize,
    score_sum: u64,
    price_sum: Decimal,
}

impl SetAccumulator {
    fn new(set: &str) -> Self {
        Self {
            set: set.to_string(),
            count: 0,
            score_sum: 0,
            price_sum: Decimal::ZERO,
        }
    }

    fn add(&mut self, item: &PricedItem) {
        self.count += 1;
        self.score_sum += u64::from(item.deal_score);
        self.price_sum += item.current_price;
    }

    fn finish(self) -> SetAggregate {
        let divisor = Decimal::from(self.count.max(1));
        SetAggregate {
            set: self.set,
            count: self.count,
            average_score: Decimal::from(self.score_sum) / divisor,
            average_price: self.price_sum / divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn engine() -> DealAnalyticsEngine {
        DealAnalyticsEngine::new(
            PriceBuckets::new(vec![dec!(10), dec!(50), dec!(100)]).unwrap(),
        )
    }

    fn item(id: i64, name: &str, price: Decimal, score: u8) -> PricedItem {
        PricedItem {
            id,
            name: name.to_string(),
            set: None,
            current_price: price,
            market_avg_price: None,
            deal_score: score,
            confidence: None,
        }
    }

    fn item_in_set(id: i64, name: &str, set: &str, price: Decimal, score: u8) -> PricedItem {
        PricedItem {
            set: Some(set.to_string()),
            ..item(id, name, price, score)
        }
    }

    fn item_with_avg(id: i64, price: Decimal, avg: Decimal, score: u8) -> PricedItem {
        PricedItem {
            market_avg_price: Some(avg),
            ..item(id, "item", price, score)
        }
    }

    fn signal(id: i64, level: SignalLevel, signal_type: &str, minute: u32) -> Signal {
        Signal {
            id,
            signal_type: signal_type.to_string(),
            signal_level: level,
            product_name: "Umbreon VMAX".to_string(),
            product_set: None,
            current_price: None,
            deal_score: None,
            description: None,
            detected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn search_matches_name_or_set_case_insensitively() {
        let items = vec![
            item(1, "Charizard", dec!(5), 70),
            item(2, "Blastoise", dec!(3), 70),
            item_in_set(3, "Booster Box", "Charged Storm", dec!(80), 70),
        ];
        let criteria = FilterCriteria {
            search: "char".to_string(),
            ..FilterCriteria::default()
        };

        let result = engine().filter_and_sort(&items, &criteria, Some(SortKey::PriceAsc));
        let names: Vec<&str> = result.iter().map(|i| i.name.as_str()).collect();
        // Blastoise fails the search filter regardless of its lower price;
        // the set-name match keeps the booster box in.
        assert_eq!(names, vec!["Charizard", "Booster Box"]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let items = vec![
            item(1, "a", dec!(10), 50),
            item(2, "b", dec!(20), 80),
            item(3, "c", dec!(30), 100),
        ];
        let criteria = FilterCriteria {
            min_score: 50,
            max_score: 80,
            min_price: dec!(10),
            max_price: dec!(20),
            ..FilterCriteria::default()
        };

        let result = engine().filter_and_sort(&items, &criteria, None);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn tightening_a_bound_never_grows_the_result() {
        let items: Vec<PricedItem> = (0..20)
            .map(|i| item(i, "card", Decimal::from(i), (i * 5) as u8))
            .collect();
        let wide = FilterCriteria::default();
        let mut previous = engine().filter_and_sort(&items, &wide, None).len();

        for min_score in [10, 30, 50, 70, 90] {
            let narrowed = FilterCriteria {
                min_score,
                ..wide.clone()
            };
            let size = engine().filter_and_sort(&items, &narrowed, None).len();
            assert!(size <= previous);
            previous = size;
        }
    }

    #[test]
    fn watchlist_restriction_drops_unresolved_ids() {
        let items = vec![item(1, "a", dec!(1), 60), item(2, "b", dec!(2), 60)];
        let criteria = FilterCriteria {
            restrict_to: Some(HashSet::from([2, 999])),
            ..FilterCriteria::default()
        };

        let result = engine().filter_and_sort(&items, &criteria, None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn filter_and_sort_is_idempotent() {
        let items = vec![
            item(1, "a", dec!(9), 70),
            item(2, "b", dec!(5), 70),
            item(3, "c", dec!(7), 90),
        ];
        let criteria = FilterCriteria::default();

        let first = engine().filter_and_sort(&items, &criteria, Some(SortKey::ScoreDesc));
        let second = engine().filter_and_sort(&items, &criteria, Some(SortKey::ScoreDesc));
        assert_eq!(first, second);
    }

    #[test]
    fn equal_scores_keep_snapshot_order() {
        let items = vec![
            item(1, "first", dec!(1), 70),
            item(2, "second", dec!(2), 70),
            item(3, "third", dec!(3), 70),
        ];

        let result = engine().filter_and_sort(&items, &FilterCriteria::default(), Some(SortKey::ScoreDesc));
        let ids: Vec<i64> = result.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn missing_sort_key_keeps_snapshot_order() {
        let items = vec![item(2, "b", dec!(2), 10), item(1, "a", dec!(1), 90)];
        let result = engine().filter_and_sort(&items, &FilterCriteria::default(), SortKey::parse("bogus"));
        let ids: Vec<i64> = result.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn savings_sort_places_missing_average_mid_pack() {
        let discounted = item_with_avg(1, dec!(10), dec!(20), 70); // savings 0.5
        let no_average = item(2, "plain", dec!(10), 70); // savings 0
        let premium = item_with_avg(3, dec!(25), dec!(20), 70); // savings -0.25

        let items = vec![premium, no_average, discounted];
        let result = engine().filter_and_sort(&items, &FilterCriteria::default(), Some(SortKey::SavingsDesc));
        let ids: Vec<i64> = result.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn movers_rank_by_signed_deviation() {
        let items = vec![
            item_with_avg(1, dec!(10), dec!(20), 85),
            item_with_avg(2, dec!(30), dec!(20), 60),
        ];

        let movers = engine().compute_movers(&items);
        assert_eq!(movers.below_average.len(), 1);
        assert_eq!(movers.below_average[0].item.id, 1);
        assert_eq!(movers.below_average[0].delta_pct, dec!(-50));
        assert_eq!(movers.above_average.len(), 1);
        assert_eq!(movers.above_average[0].item.id, 2);
        assert_eq!(movers.above_average[0].delta_pct, dec!(50));
    }

    #[test]
    fn movers_exclude_unusable_and_at_market_items() {
        let items = vec![
            item(1, "no average", dec!(10), 70),
            item_with_avg(2, dec!(10), Decimal::ZERO, 70),
            item_with_avg(3, dec!(20), dec!(20), 70), // exactly at market
            item_with_avg(4, dec!(10), dec!(40), 70),
            item_with_avg(5, dec!(30), dec!(20), 70),
        ];

        let movers = engine().compute_movers(&items);
        let below: HashSet<i64> = movers.below_average.iter().map(|r| r.item.id).collect();
        let above: HashSet<i64> = movers.above_average.iter().map(|r| r.item.id).collect();

        assert_eq!(below, HashSet::from([4]));
        assert_eq!(above, HashSet::from([5]));
        assert!(below.is_disjoint(&above));
    }

    #[test]
    fn movers_order_most_extreme_first() {
        let items = vec![
            item_with_avg(1, dec!(18), dec!(20), 70), // -10%
            item_with_avg(2, dec!(10), dec!(20), 70), // -50%
            item_with_avg(3, dec!(22), dec!(20), 70), // +10%
            item_with_avg(4, dec!(40), dec!(20), 70), // +100%
        ];

        let movers = engine().compute_movers(&items);
        let below: Vec<i64> = movers.below_average.iter().map(|r| r.item.id).collect();
        let above: Vec<i64> = movers.above_average.iter().map(|r| r.item.id).collect();
        assert_eq!(below, vec![2, 1]);
        assert_eq!(above, vec![4, 3]);
    }

    #[test]
    fn distributions_partition_every_item_exactly_once() {
        let items = vec![
            item(1, "a", dec!(4), 85),
            item(2, "b", dec!(10), 70), // lands in [10, 50), not [0, 10)
            item(3, "c", dec!(60), 55),
            item(4, "d", dec!(500), 30),
            item(5, "e", dec!(49.99), 90),
        ];

        let dist = engine().compute_distributions(&items);
        let price_total: usize = dist.price_buckets.iter().map(|b| b.count).sum();
        assert_eq!(price_total, items.len());
        assert_eq!(dist.score_buckets.total(), items.len());

        let counts: Vec<usize> = dist.price_buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 1, 1]);
    }

    #[test]
    fn distributions_on_empty_input_are_all_zero() {
        let dist = engine().compute_distributions(&[]);
        assert_eq!(dist.average_price, Decimal::ZERO);
        assert_eq!(dist.average_score, Decimal::ZERO);
        assert!(dist.price_buckets.iter().all(|b| b.count == 0));
        assert_eq!(dist.score_buckets.total(), 0);
        assert!(dist.set_aggregates.is_empty());
    }

    #[test]
    fn distributions_compute_arithmetic_means() {
        let items = vec![item(1, "a", dec!(10), 80), item(2, "b", dec!(20), 60)];
        let dist = engine().compute_distributions(&items);
        assert_eq!(dist.average_price, dec!(15));
        assert_eq!(dist.average_score, dec!(70));
    }

    #[test]
    fn missing_set_groups_under_unknown() {
        let items = vec![item(1, "loose single", dec!(3), 75)];
        let dist = engine().compute_distributions(&items);
        assert_eq!(dist.set_aggregates.len(), 1);
        assert_eq!(dist.set_aggregates[0].set, UNKNOWN_SET);
        assert_eq!(dist.set_aggregates[0].count, 1);
    }

    #[test]
    fn set_aggregates_sort_by_count_with_stable_ties() {
        let items = vec![
            item_in_set(1, "a", "Obsidian Flames", dec!(10), 80),
            item_in_set(2, "b", "Crown Zenith", dec!(20), 60),
            item_in_set(3, "c", "Crown Zenith", dec!(30), 90),
            item_in_set(4, "d", "Paldea Evolved", dec!(40), 70),
        ];

        let dist = engine().compute_distributions(&items);
        let sets: Vec<&str> = dist.set_aggregates.iter().map(|a| a.set.as_str()).collect();
        // Crown Zenith leads on count; the singletons keep first-seen order.
        assert_eq!(sets, vec!["Crown Zenith", "Obsidian Flames", "Paldea Evolved"]);
        assert_eq!(dist.set_aggregates[0].average_price, dec!(25));
        assert_eq!(dist.set_aggregates[0].average_score, dec!(75));
    }

    #[test]
    fn alert_below_triggers_at_or_under_target() {
        let alert = PriceAlert::new("pikachu", dec!(20), AlertDirection::Below).unwrap();
        let items = vec![item(1, "Pikachu VMAX", dec!(18), 70)];

        let evaluated = engine().evaluate_alerts(&[alert], &items);
        assert_eq!(evaluated.len(), 1);
        assert!(evaluated[0].triggered);
        assert_eq!(evaluated[0].current_price, Some(dec!(18)));
        assert_eq!(evaluated[0].matched_name.as_deref(), Some("Pikachu VMAX"));
    }

    #[test]
    fn alert_above_triggers_at_or_over_target() {
        let alert = PriceAlert::new("charizard", dec!(100), AlertDirection::Above).unwrap();
        let items = vec![item(1, "Charizard UPC", dec!(100), 70)];

        let evaluated = engine().evaluate_alerts(&[alert], &items);
        assert!(evaluated[0].triggered);
    }

    #[test]
    fn alert_without_match_is_untriggered() {
        let alert = PriceAlert::new("mewtwo", dec!(10), AlertDirection::Below).unwrap();
        let items = vec![item(1, "Pikachu VMAX", dec!(5), 70)];

        let evaluated = engine().evaluate_alerts(&[alert], &items);
        assert!(!evaluated[0].triggered);
        assert_eq!(evaluated[0].current_price, None);
        assert_eq!(evaluated[0].matched_name, None);
    }

    #[test]
    fn alert_matching_takes_first_item_in_snapshot_order() {
        let alert = PriceAlert::new("pikachu", dec!(20), AlertDirection::Below).unwrap();
        let items = vec![
            item(1, "Pikachu V", dec!(50), 70),
            item(2, "Pikachu VMAX", dec!(5), 70),
        ];

        // The cheaper second item would trigger, but first-match wins.
        let evaluated = engine().evaluate_alerts(&[alert], &items);
        assert!(!evaluated[0].triggered);
        assert_eq!(evaluated[0].current_price, Some(dec!(50)));
    }

    #[test]
    fn signals_rank_by_level_then_recency() {
        let signals = vec![
            signal(1, SignalLevel::Low, "momentum", 10),
            signal(2, SignalLevel::High, "undervalued", 5),
            signal(3, SignalLevel::High, "undervalued", 30),
            signal(4, SignalLevel::Medium, "risk", 50),
        ];

        let ranked = engine().rank_signals(&signals);
        let ids: Vec<i64> = ranked.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn signals_filter_by_level_and_type() {
        let signals = vec![
            signal(1, SignalLevel::High, "undervalued", 1),
            signal(2, SignalLevel::High, "momentum", 2),
            signal(3, SignalLevel::Low, "undervalued", 3),
        ];

        let eng = engine();
        assert_eq!(eng.filter_signals(&signals, Some(SignalLevel::High), None).len(), 2);
        assert_eq!(eng.filter_signals(&signals, None, Some("undervalued")).len(), 2);
        assert_eq!(
            eng.filter_signals(&signals, Some(SignalLevel::High), Some("undervalued"))
                .len(),
            1
        );

        let counts = eng.level_counts(&signals);
        assert_eq!((counts.high, counts.medium, counts.low), (2, 0, 1));
    }

    #[test]
    fn bucket_edges_must_ascend() {
        assert!(PriceBuckets::new(vec![]).is_ok());
        assert!(PriceBuckets::new(vec![dec!(10), dec!(10)]).is_err());
        assert!(PriceBuckets::new(vec![dec!(50), dec!(10)]).is_err());
        assert!(PriceBuckets::new(vec![dec!(0)]).is_err());
    }
}
