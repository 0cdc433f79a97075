use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Preference store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    Json(#[from] serde_json::Error),
}
