use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Invalid exchange rate for {0}: {1}")]
    InvalidRate(String, Decimal),
}

/// A failure local to a single asset's margin.
///
/// These never abort an analysis; they are collected into the `AnalysisResult`
/// next to the margins that could be computed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarginComputationError {
    #[error("No exchange rate for base currency {currency} of asset {asset}")]
    MissingRate { asset: String, currency: String },

    #[error("Asset {asset} has no {field}")]
    MissingInput { asset: String, field: String },

    #[error("Arithmetic overflow while computing the margin of asset {asset}")]
    Overflow { asset: String },
}

impl MarginComputationError {
    /// The asset the failure belongs to.
    pub fn asset(&self) -> &str {
        match self {
            MarginComputationError::MissingRate { asset, .. }
            | MarginComputationError::MissingInput { asset, .. }
            | MarginComputationError::Overflow { asset } => asset,
        }
    }
}
