use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to perform the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The API request returned status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}
