use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Malformed user input, rejected before any network call.
    #[error("{0}")]
    ValidationError(String),
    /// Remote status lookup failed after all retries.
    #[error("Fetch error: {0}")]
    FetchError(String),
    /// The chat transport refused a message.
    #[error("Delivery error: {0}")]
    DeliveryError(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    StorageError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for TrackerError {
    fn from(err: rocksdb::Error) -> Self {
        TrackerError::StorageError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
