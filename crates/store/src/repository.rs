use crate::error::StoreError;
use core_types::{PriceAlert, Watchlist};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

/// Blob key holding the watchlist id array.
pub const WATCHLIST_KEY: &str = "watchlist";
/// Blob key holding the price-alert rule list.
pub const PRICE_ALERTS_KEY: &str = "price_alerts";

/// The `PreferenceRepository` provides a high-level, application-specific
/// interface to the preference store. It encapsulates all SQL and blob
/// (de)serialization.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: SqlitePool,
}

impl PreferenceRepository {
    /// Creates a new `PreferenceRepository` with a shared connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetches the raw blob stored under `(user, key)`, if any.
    pub async fn get_blob(&self, user: &str, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM preferences WHERE user_id = ?1 AND key = ?2")
            .bind(user)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Stores `value` under `(user, key)`, replacing any previous blob.
    pub async fn put_blob(&self, user: &str, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO preferences (user_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(user)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the blob stored under `(user, key)`.
    pub async fn delete_blob(&self, user: &str, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM preferences WHERE user_id = ?1 AND key = ?2")
            .bind(user)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Loads the user's watchlist. A missing blob is an empty watchlist,
    /// never an error.
    pub async fn load_watchlist(&self, user: &str) -> Result<Watchlist, StoreError> {
        match self.get_blob(user, WATCHLIST_KEY).await? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Watchlist::new()),
        }
    }

    pub async fn save_watchlist(
        &self,
        user: &str,
        watchlist: &Watchlist,
    ) -> Result<(), StoreError> {
        let blob = serde_json::to_string(watchlist)?;
        self.put_blob(user, WATCHLIST_KEY, &blob).await
    }

    /// Flips watchlist membership for `item_id` and persists the result in
    /// one call. Returns whether the item is watched afterwards.
    pub async fn toggle_watch(&self, user: &str, item_id: i64) -> Result<bool, StoreError> {
        let mut watchlist = self.load_watchlist(user).await?;
        let watched = watchlist.toggle(item_id);
        self.save_watchlist(user, &watchlist).await?;
        tracing::debug!(user, item_id, watched, "toggled watchlist entry");
        Ok(watched)
    }

    /// Loads the user's price alerts. A missing blob is an empty list.
    pub async fn load_alerts(&self, user: &str) -> Result<Vec<PriceAlert>, StoreError> {
        match self.get_blob(user, PRICE_ALERTS_KEY).await? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_alerts(&self, user: &str, alerts: &[PriceAlert]) -> Result<(), StoreError> {
        let blob = serde_json::to_string(alerts)?;
        self.put_blob(user, PRICE_ALERTS_KEY, &blob).await
    }

    /// Appends a new alert rule and persists the list in one call.
    pub async fn add_alert(&self, user: &str, alert: PriceAlert) -> Result<(), StoreError> {
        let mut alerts = self.load_alerts(user).await?;
        alerts.push(alert);
        self.save_alerts(user, &alerts).await
    }

    /// Deletes the alert with `alert_id`, reporting whether it existed.
    pub async fn remove_alert(&self, user: &str, alert_id: Uuid) -> Result<bool, StoreError> {
        let mut alerts = self.load_alerts(user).await?;
        let before = alerts.len();
        alerts.retain(|alert| alert.id != alert_id);
        let removed = alerts.len() != before;
        if removed {
            self.save_alerts(user, &alerts).await?;
        }
        Ok(removed)
    }

    /// Drops every stored preference for the user (the "clear cache"
    /// action).
    pub async fn clear(&self, user: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM preferences WHERE user_id = ?1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::init_schema;
    use core_types::AlertDirection;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

    async fn repository() -> PreferenceRepository {
        // A single connection keeps the in-memory database alive and shared
        // for the whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        PreferenceRepository::new(pool)
    }

    #[tokio::test]
    async fn missing_blobs_default_to_empty_values() {
        let repo = repository().await;
        assert!(repo.load_watchlist("ash").await.unwrap().is_empty());
        assert!(repo.load_alerts("ash").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_watch_round_trips() {
        let repo = repository().await;
        assert!(repo.toggle_watch("ash", 42).await.unwrap());
        assert!(repo.load_watchlist("ash").await.unwrap().contains(42));
        assert!(!repo.toggle_watch("ash", 42).await.unwrap());
        assert!(repo.load_watchlist("ash").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn watchlists_are_scoped_per_user() {
        let repo = repository().await;
        repo.toggle_watch("ash", 1).await.unwrap();
        assert!(repo.load_watchlist("misty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn alerts_round_trip_and_remove() {
        let repo = repository().await;
        let alert = PriceAlert::new("pikachu", dec!(20), AlertDirection::Below).unwrap();
        let alert_id = alert.id;

        repo.add_alert("ash", alert).await.unwrap();
        let loaded = repo.load_alerts("ash").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].product_name_pattern, "pikachu");
        assert_eq!(loaded[0].target_price, dec!(20));

        assert!(repo.remove_alert("ash", alert_id).await.unwrap());
        assert!(!repo.remove_alert("ash", alert_id).await.unwrap());
        assert!(repo.load_alerts("ash").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_drops_all_user_preferences() {
        let repo = repository().await;
        repo.toggle_watch("ash", 1).await.unwrap();
        repo.put_blob("ash", "onboarding", "true").await.unwrap();
        repo.clear("ash").await.unwrap();
        assert!(repo.get_blob("ash", "onboarding").await.unwrap().is_none());
        assert!(repo.load_watchlist("ash").await.unwrap().is_empty());
    }
}
