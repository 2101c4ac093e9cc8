use serde::{Deserialize, Serialize};
use std::fmt;

/// The actionable band an asset falls into once its margin has been classified.
///
/// Variants are declared from most to least attractive, so the derived `Ord`
/// sorts `StrongBuy` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecommendationAction {
    StrongBuy,
    Buy,
    Hold,
    Avoid,
    StrongAvoid,
}

impl RecommendationAction {
    /// All bands, best first.
    pub const ALL: [RecommendationAction; 5] = [
        RecommendationAction::StrongBuy,
        RecommendationAction::Buy,
        RecommendationAction::Hold,
        RecommendationAction::Avoid,
        RecommendationAction::StrongAvoid,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecommendationAction::StrongBuy => "Strong Buy",
            RecommendationAction::Buy => "Buy",
            RecommendationAction::Hold => "Hold",
            RecommendationAction::Avoid => "Avoid",
            RecommendationAction::StrongAvoid => "Strong Avoid",
        }
    }
}

impl fmt::Display for RecommendationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies which of the two external oracles an event or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adapter {
    RateOracle,
    MarketSignal,
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adapter::RateOracle => f.write_str("rate oracle"),
            Adapter::MarketSignal => f.write_str("market signal"),
        }
    }
}
