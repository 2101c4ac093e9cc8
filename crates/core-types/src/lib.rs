//! # Differential Core Types
//!
//! The shared vocabulary of the differential analysis workspace: the market data a
//! caller submits, the signals and exchange rates the oracles return, and the margins
//! and recommendations the engine produces.
//!
//! As a Layer 0 crate it has no knowledge of oracles, configuration or I/O. Every
//! collection is an ordered `BTreeMap`/`BTreeSet` so that iteration, and therefore
//! every result built from it, is deterministic.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Adapter, RecommendationAction};
pub use error::{CoreError, MarginComputationError};
pub use structs::{
    AnalysisResult, AssetSignal, ExchangeRates, MarketData, ProfitMargin, Recommendation,
    SignalSet,
};
