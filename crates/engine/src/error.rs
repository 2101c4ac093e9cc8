use core_types::{Adapter, CoreError};
use oracles::error::ApiError;
use ranker::RankerError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid market data: {0}")]
    InvalidInput(#[from] CoreError),

    #[error("Invalid analysis options: {0}")]
    InvalidOptions(#[from] RankerError),

    #[error("Exchange rates unavailable: {0}")]
    RateUnavailable(#[source] ApiError),

    #[error("Market signal unavailable: {0}")]
    SignalUnavailable(#[source] ApiError),

    #[error("The {adapter} did not answer within {timeout:?}")]
    AdapterTimeout { adapter: Adapter, timeout: Duration },
}

impl EngineError {
    /// Whether repeating the same call may succeed.
    ///
    /// Oracle failures and timeouts are transient; bad input or options are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::InvalidInput(_) | EngineError::InvalidOptions(_) => false,
            EngineError::RateUnavailable(_)
            | EngineError::SignalUnavailable(_)
            | EngineError::AdapterTimeout { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_oracle_failures_are_retryable() {
        let invalid = EngineError::InvalidInput(CoreError::InvalidInput(
            "assets".to_string(),
            "empty".to_string(),
        ));
        let timeout = EngineError::AdapterTimeout {
            adapter: Adapter::RateOracle,
            timeout: Duration::from_secs(1),
        };
        let rates = EngineError::RateUnavailable(ApiError::RateUnavailable("down".to_string()));

        assert!(!invalid.is_retryable());
        assert!(timeout.is_retryable());
        assert!(rates.is_retryable());
    }

    #[test]
    fn timeout_message_names_the_adapter() {
        let err = EngineError::AdapterTimeout {
            adapter: Adapter::MarketSignal,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "The market signal did not answer within 250ms");
    }
}
