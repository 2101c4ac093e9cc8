//! # Differential Oracles
//!
//! The two narrow capabilities the engine depends on, and the adapters that
//! provide them.
//!
//! - `RateOracle`: currency exchange rates for a set of currency codes.
//! - `MarketSignal`: predictive movement scores for a set of assets.
//!
//! The engine only ever sees these traits, so any implementation (HTTP, a
//! snapshot file, a test fake) can be injected.

use crate::error::ApiError;
use async_trait::async_trait;
use core_types::{ExchangeRates, MarketData, SignalSet};
use std::collections::BTreeSet;

mod auth;
pub mod error;
pub mod fixed;
mod http;
pub mod rates;
pub mod responses;
pub mod signal;

// --- Public API ---
pub use fixed::{FixedRateOracle, FixedSignal};
pub use rates::HttpRateOracle;
pub use responses::{OracleErrorResponse, RatesResponse, SignalResponse};
pub use signal::HttpSignalClient;

/// Supplies exchange rates normalised to a single reference currency.
///
/// Implementations must quote every requested currency or fail the whole call;
/// partial rate sets are not a valid answer.
#[async_trait]
pub trait RateOracle: Send + Sync {
    async fn get_exchange_rates(
        &self,
        currencies: &BTreeSet<String>,
    ) -> Result<ExchangeRates, ApiError>;
}

/// Supplies a predictive movement signal per asset.
///
/// The answer may omit assets; the caller decides how to treat the gaps.
#[async_trait]
pub trait MarketSignal: Send + Sync {
    async fn analyze_market(
        &self,
        assets: &BTreeSet<String>,
        context: &MarketData,
    ) -> Result<SignalSet, ApiError>;
}
