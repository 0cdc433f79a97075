use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid price bucket edges: {0}")]
    InvalidBucketEdges(String),
}
