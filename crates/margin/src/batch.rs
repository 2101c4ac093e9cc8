use core_types::{AssetSignal, MarginComputationError, ProfitMargin};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// The outcome of computing margins for every asset of one snapshot.
///
/// Each asset lands in exactly one of `margins` or `errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarginBatch {
    pub margins: BTreeMap<String, ProfitMargin>,
    /// The signal actually applied to each asset, after defaults and clamping.
    pub applied_signals: BTreeMap<String, AssetSignal>,
    pub errors: Vec<MarginComputationError>,
    /// Assets computed (or attempted) without a predictive signal.
    pub degraded: BTreeSet<String>,
}

impl MarginBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of assets accounted for, successful or not.
    pub fn len(&self) -> usize {
        self.margins.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
