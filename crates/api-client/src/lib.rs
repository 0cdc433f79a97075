use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use configuration::ApiConfig;
use core_types::{MarketSnapshot, PricedItem, Signal, SignalLevel};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ApiErrorResponse, RawDealScore, RawSignal};

/// Parameters for a deal-score fetch.
#[derive(Debug, Clone, Default)]
pub struct DealScoreQuery {
    pub limit: Option<u32>,
    pub min_score: Option<u8>,
}

/// Parameters for a signal fetch.
#[derive(Debug, Clone, Default)]
pub struct SignalQuery {
    pub limit: Option<u32>,
    pub signal_level: Option<SignalLevel>,
    pub signal_type: Option<String>,
}

/// The generic, abstract interface for the market-data API.
/// This trait is the contract presentation code depends on, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches the scored deal list.
    async fn fetch_deal_scores(&self, query: &DealScoreQuery)
    -> Result<Vec<PricedItem>, ApiError>;

    /// Fetches the active market signals.
    async fn fetch_signals(&self, query: &SignalQuery) -> Result<Vec<Signal>, ApiError>;

    /// Fetches items and signals concurrently and stamps them as one
    /// immutable snapshot. This is the only asynchronous boundary the
    /// analytics layer sits behind.
    async fn fetch_snapshot(
        &self,
        deals: &DealScoreQuery,
        signals: &SignalQuery,
    ) -> Result<MarketSnapshot, ApiError> {
        let (items, signals) = tokio::join!(self.fetch_deal_scores(deals), self.fetch_signals(signals));

        Ok(MarketSnapshot {
            items: items?,
            signals: signals?,
            fetched_at: Utc::now(),
        })
    }
}

/// A concrete implementation of `MarketDataClient` for the market REST API.
#[derive(Debug, Clone)]
pub struct HttpMarketClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMarketClient {
    /// Builds a client against `config.base_url`. When an auth token is
    /// provided it is attached to every request as a bearer header; the API
    /// serves a reduced free tier without one.
    pub fn new(config: &ApiConfig, auth_token: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidData("auth token is not a valid header".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "fetching from market API");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            // The API wraps errors as {"detail": "..."}; fall back to the
            // raw body when it does not.
            let detail = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|body| body.detail)
                .unwrap_or(text);
            Err(ApiError::Api {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

#[async_trait]
impl MarketDataClient for HttpMarketClient {
    async fn fetch_deal_scores(
        &self,
        query: &DealScoreQuery,
    ) -> Result<Vec<PricedItem>, ApiError> {
        let mut params = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(min_score) = query.min_score {
            params.push(("min_score", min_score.to_string()));
        }

        let raw: Vec<RawDealScore> = self.get_json("/api/v1/deal_scores", &params).await?;
        responses::into_items(raw)
    }

    async fn fetch_signals(&self, query: &SignalQuery) -> Result<Vec<Signal>, ApiError> {
        let mut params = Vec::new();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(level) = query.signal_level {
            params.push(("signal_level", level.to_string()));
        }
        if let Some(signal_type) = &query.signal_type {
            params.push(("signal_type", signal_type.clone()));
        }

        let raw: Vec<RawSignal> = self.get_json("/api/v1/signals", &params).await?;
        responses::into_signals(raw)
    }
}
