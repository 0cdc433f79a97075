use crate::error::ApiError;
use chrono::{DateTime, Utc};
use core_types::{PricedItem, Signal, SignalLevel};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use std::collections::HashSet;

/// One deal score row from `GET /api/v1/deal_scores`.
///
/// Wire shapes are kept loose here on purpose; this module is the single
/// place where value ranges are checked before data enters the core types.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDealScore {
    pub id: i64,
    pub product_name: String,
    pub product_set: Option<String>,
    pub current_price: Decimal,
    pub market_avg_price: Option<Decimal>,
    pub deal_score: Decimal,
    pub confidence: Option<Decimal>,
    pub calculated_at: Option<DateTime<Utc>>,
}

/// One signal row from `GET /api/v1/signals`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSignal {
    pub id: i64,
    pub signal_type: String,
    pub signal_level: String,
    pub product_name: String,
    pub product_set: Option<String>,
    pub current_price: Option<Decimal>,
    pub deal_score: Option<Decimal>,
    pub description: Option<String>,
    pub detected_at: DateTime<Utc>,
}

/// The error body the market API returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
}

/// Maps and validates a page of deal scores into core items.
///
/// Enforces the snapshot invariants once, here: unique ids, scores within
/// [0, 100], non-negative prices. Anything out of range is an
/// `ApiError::InvalidData` rather than a panic further down.
pub fn into_items(raw: Vec<RawDealScore>) -> Result<Vec<PricedItem>, ApiError> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(|row| {
            if !seen.insert(row.id) {
                return Err(ApiError::InvalidData(format!(
                    "duplicate item id {} in snapshot",
                    row.id
                )));
            }
            if row.product_name.trim().is_empty() {
                return Err(ApiError::InvalidData(format!(
                    "item {} has an empty name",
                    row.id
                )));
            }
            if row.current_price < Decimal::ZERO {
                return Err(ApiError::InvalidData(format!(
                    "item {} has negative price {}",
                    row.id, row.current_price
                )));
            }
            if row.market_avg_price.is_some_and(|avg| avg < Decimal::ZERO) {
                return Err(ApiError::InvalidData(format!(
                    "item {} has negative market average",
                    row.id
                )));
            }

            Ok(PricedItem {
                id: row.id,
                name: row.product_name,
                set: row.product_set,
                current_price: row.current_price,
                market_avg_price: row.market_avg_price,
                deal_score: score_to_u8(row.deal_score, row.id)?,
                confidence: row
                    .confidence
                    .map(|value| score_to_u8(value, row.id))
                    .transpose()?,
            })
        })
        .collect()
}

/// Maps and validates a page of signals.
pub fn into_signals(raw: Vec<RawSignal>) -> Result<Vec<Signal>, ApiError> {
    raw.into_iter()
        .map(|row| {
            let signal_level = SignalLevel::parse(&row.signal_level).ok_or_else(|| {
                ApiError::InvalidData(format!(
                    "signal {} has unknown level '{}'",
                    row.id, row.signal_level
                ))
            })?;

            Ok(Signal {
                id: row.id,
                signal_type: row.signal_type,
                signal_level,
                product_name: row.product_name,
                product_set: row.product_set,
                current_price: row.current_price,
                deal_score: row
                    .deal_score
                    .map(|value| score_to_u8(value, row.id))
                    .transpose()?,
                description: row.description,
                detected_at: row.detected_at,
            })
        })
        .collect()
}

/// The API stores scores as decimals (e.g. 85.50); core types carry them as
/// integers in [0, 100].
fn score_to_u8(value: Decimal, id: i64) -> Result<u8, ApiError> {
    value
        .round()
        .to_u8()
        .filter(|score| *score <= 100)
        .ok_or_else(|| ApiError::InvalidData(format!("item {id} has out-of-range score {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(id: i64, score: Decimal, price: Decimal) -> RawDealScore {
        RawDealScore {
            id,
            product_name: "Charizard VSTAR".to_string(),
            product_set: Some("Brilliant Stars".to_string()),
            current_price: price,
            market_avg_price: Some(dec!(20)),
            deal_score: score,
            confidence: Some(dec!(92.4)),
            calculated_at: None,
        }
    }

    #[test]
    fn maps_wire_rows_into_items() {
        let items = into_items(vec![raw(1, dec!(85.5), dec!(17.99))]).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].deal_score, 86);
        assert_eq!(items[0].confidence, Some(92));
        assert_eq!(items[0].set.as_deref(), Some("Brilliant Stars"));
    }

    #[test]
    fn rejects_out_of_range_scores_and_prices() {
        assert!(into_items(vec![raw(1, dec!(120), dec!(5))]).is_err());
        assert!(into_items(vec![raw(1, dec!(-3), dec!(5))]).is_err());
        assert!(into_items(vec![raw(1, dec!(80), dec!(-5))]).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = into_items(vec![raw(7, dec!(80), dec!(5)), raw(7, dec!(60), dec!(9))]);
        assert!(matches!(result, Err(ApiError::InvalidData(_))));
    }

    #[test]
    fn parses_signal_payload() {
        let json = r#"[{
            "id": 3,
            "signal_type": "undervalued",
            "signal_level": "high",
            "product_name": "Lugia V",
            "product_set": null,
            "current_price": "42.00",
            "deal_score": 88,
            "description": "priced 30% under market",
            "detected_at": "2024-05-01T12:00:00Z"
        }]"#;
        let raw: Vec<RawSignal> = serde_json::from_str(json).unwrap();
        let signals = into_signals(raw).unwrap();
        assert_eq!(signals[0].signal_level, SignalLevel::High);
        assert_eq!(signals[0].deal_score, Some(88));
    }

    #[test]
    fn unknown_signal_level_is_invalid_data() {
        let row = RawSignal {
            id: 1,
            signal_type: "momentum".to_string(),
            signal_level: "urgent".to_string(),
            product_name: "Mew ex".to_string(),
            product_set: None,
            current_price: None,
            deal_score: None,
            description: None,
            detected_at: Utc::now(),
        };
        assert!(matches!(
            into_signals(vec![row]),
            Err(ApiError::InvalidData(_))
        ));
    }
}
