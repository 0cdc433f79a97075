use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a market signal. The derived ordering is the alerting
/// priority: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    Low,
    Medium,
    High,
}

impl SignalLevel {
    /// Parses the wire representation used by the market API.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "high" => Some(SignalLevel::High),
            "medium" => Some(SignalLevel::Medium),
            "low" => Some(SignalLevel::Low),
            _ => None,
        }
    }
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalLevel::High => write!(f, "high"),
            SignalLevel::Medium => write!(f, "medium"),
            SignalLevel::Low => write!(f, "low"),
        }
    }
}

/// Quality tier of a deal score.
///
/// One canonical threshold scheme is applied everywhere:
/// excellent >= 80, good in [65, 80), fair in [50, 65), low < 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Low,
}

impl QualityTier {
    pub fn of(deal_score: u8) -> Self {
        match deal_score {
            80.. => QualityTier::Excellent,
            65..=79 => QualityTier::Good,
            50..=64 => QualityTier::Fair,
            _ => QualityTier::Low,
        }
    }

    /// All tiers, best first. Used to lay out score distributions.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Excellent,
        QualityTier::Good,
        QualityTier::Fair,
        QualityTier::Low,
    ];
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTier::Excellent => write!(f, "excellent"),
            QualityTier::Good => write!(f, "good"),
            QualityTier::Fair => write!(f, "fair"),
            QualityTier::Low => write!(f, "low"),
        }
    }
}

/// Ordering applied to a filtered deal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    ScoreDesc,
    PriceAsc,
    PriceDesc,
    SavingsDesc,
}

impl SortKey {
    /// Lenient parser for user-supplied sort keys. An unrecognized key maps
    /// to `None`, which downstream means "keep the input order" rather than
    /// an error.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "score-desc" => Some(SortKey::ScoreDesc),
            "price-asc" => Some(SortKey::PriceAsc),
            "price-desc" => Some(SortKey::PriceDesc),
            "savings-desc" => Some(SortKey::SavingsDesc),
            _ => None,
        }
    }
}

/// Direction of a price alert: trigger when the live price crosses the
/// target from above (`Below`) or from below (`Above`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Below,
    Above,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertDirection::Below => write!(f, "below"),
            AlertDirection::Above => write!(f, "above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_tier_boundaries() {
        assert_eq!(QualityTier::of(100), QualityTier::Excellent);
        assert_eq!(QualityTier::of(80), QualityTier::Excellent);
        assert_eq!(QualityTier::of(79), QualityTier::Good);
        assert_eq!(QualityTier::of(65), QualityTier::Good);
        assert_eq!(QualityTier::of(64), QualityTier::Fair);
        assert_eq!(QualityTier::of(50), QualityTier::Fair);
        assert_eq!(QualityTier::of(49), QualityTier::Low);
        assert_eq!(QualityTier::of(0), QualityTier::Low);
    }

    #[test]
    fn signal_level_priority_order() {
        assert!(SignalLevel::High > SignalLevel::Medium);
        assert!(SignalLevel::Medium > SignalLevel::Low);
        assert_eq!(SignalLevel::parse("HIGH"), Some(SignalLevel::High));
        assert_eq!(SignalLevel::parse("urgent"), None);
    }

    #[test]
    fn sort_key_parse_is_lenient() {
        assert_eq!(SortKey::parse("score-desc"), Some(SortKey::ScoreDesc));
        assert_eq!(SortKey::parse("SAVINGS-DESC"), Some(SortKey::SavingsDesc));
        assert_eq!(SortKey::parse("alphabetical"), None);
        assert_eq!(SortKey::parse(""), None);
    }
}
