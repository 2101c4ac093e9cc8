use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The oracle returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to deserialize the oracle response: {0}")]
    Deserialization(String),

    #[error("Invalid data from oracle: {0}")]
    InvalidData(String),

    #[error("Exchange rates unavailable: {0}")]
    RateUnavailable(String),

    #[error("Market signal unavailable: {0}")]
    SignalUnavailable(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::InvalidData(err.to_string())
    }
}
