use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub analytics: AnalyticsConfig,
    pub store: StoreConfig,
    /// Optional alert delivery; when the section is missing, Telegram
    /// notifications are disabled.
    pub telegram: Option<TelegramConfig>,
}

/// Connection parameters for the market-data REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the market API (e.g., "http://localhost:8000").
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum number of items/signals requested per snapshot fetch.
    pub snapshot_limit: u32,
}

/// Parameters shaping the analytics views.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Ascending edges of the price histogram. Edges [10, 50, 100] yield the
    /// ranges [0,10), [10,50), [50,100), [100,inf).
    pub price_bucket_edges: Vec<Decimal>,
    /// Deal-score floor applied when fetching the snapshot.
    pub default_min_score: u8,
}

/// Location of the local preference store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite database file holding watchlists and alerts.
    pub database_path: String,
}

/// Credentials for the Telegram Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}
