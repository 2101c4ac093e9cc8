use crate::enums::RecommendationAction;
use crate::error::{CoreError, MarginComputationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The caller-supplied snapshot of the market that an analysis runs against.
///
/// The engine only ever borrows this struct; it is never mutated once handed over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    /// Unique asset identifiers (e.g., "EURUSD-PERP").
    pub assets: BTreeSet<String>,
    /// Unique currency codes, ISO-4217 style (e.g., "USD", "JPY").
    pub currencies: BTreeSet<String>,
    /// Notional trade volume per asset, in the asset's base currency.
    pub trade_volumes: BTreeMap<String, Decimal>,
    /// Financing cost per asset as a fraction of notional. Negative values are subsidies.
    pub financing_rates: BTreeMap<String, Decimal>,
    /// The currency each asset is denominated in.
    pub base_currencies: BTreeMap<String, String>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset together with all of its per-asset inputs.
    ///
    /// The base currency is added to the currency set as well.
    pub fn with_asset(
        mut self,
        asset: &str,
        base_currency: &str,
        trade_volume: Decimal,
        financing_rate: Decimal,
    ) -> Self {
        self.assets.insert(asset.to_string());
        self.currencies.insert(base_currency.to_string());
        self.trade_volumes.insert(asset.to_string(), trade_volume);
        self.financing_rates.insert(asset.to_string(), financing_rate);
        self.base_currencies
            .insert(asset.to_string(), base_currency.to_string());
        self
    }

    /// Adds a currency without attaching any asset to it.
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currencies.insert(currency.to_string());
        self
    }

    pub fn trade_volume(&self, asset: &str) -> Option<Decimal> {
        self.trade_volumes.get(asset).copied()
    }

    pub fn financing_rate(&self, asset: &str) -> Option<Decimal> {
        self.financing_rates.get(asset).copied()
    }

    pub fn base_currency(&self, asset: &str) -> Option<&str> {
        self.base_currencies.get(asset).map(String::as_str)
    }

    /// Checks every invariant the engine relies on.
    ///
    /// Fails on the first violation found, walking assets in identifier order so the
    /// reported violation is stable across runs.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.assets.is_empty() {
            return Err(invalid("assets", "the asset set is empty"));
        }
        if let Some(code) = self.currencies.iter().find(|c| c.trim().is_empty()) {
            return Err(invalid("currencies", &format!("blank currency code {code:?}")));
        }

        for asset in &self.assets {
            if asset.trim().is_empty() {
                return Err(invalid("assets", "blank asset identifier"));
            }

            let volume = self
                .trade_volume(asset)
                .ok_or_else(|| invalid(asset, "no trade volume provided"))?;
            if volume < Decimal::ZERO {
                return Err(invalid(asset, &format!("negative trade volume {volume}")));
            }

            if self.financing_rate(asset).is_none() {
                return Err(invalid(asset, "no financing rate provided"));
            }

            let base = self
                .base_currency(asset)
                .ok_or_else(|| invalid(asset, "no base currency provided"))?;
            if !self.currencies.contains(base) {
                return Err(invalid(
                    asset,
                    &format!("base currency {base} is not in the currency set"),
                ));
            }
        }

        let mapped_keys = self
            .trade_volumes
            .keys()
            .chain(self.financing_rates.keys())
            .chain(self.base_currencies.keys());
        for key in mapped_keys {
            if !self.assets.contains(key) {
                return Err(invalid(key, "mapping entry for an asset that is not in the asset set"));
            }
        }

        Ok(())
    }
}

fn invalid(subject: &str, reason: &str) -> CoreError {
    CoreError::InvalidInput(subject.to_string(), reason.to_string())
}

/// The predictive signal for a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSignal {
    /// Signed expected movement, conventionally in [-1, 1] but unbounded.
    pub movement_score: Decimal,
    /// Reliability weight in [0, 1].
    pub confidence: Decimal,
}

impl AssetSignal {
    /// The signal assumed for an asset the market signal oracle said nothing about.
    pub const ABSENT: AssetSignal = AssetSignal {
        movement_score: Decimal::ZERO,
        confidence: Decimal::ZERO,
    };

    pub fn new(movement_score: Decimal, confidence: Decimal) -> Self {
        Self {
            movement_score,
            confidence,
        }
    }

    /// Returns a copy with the confidence forced into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            movement_score: self.movement_score,
            confidence: self.confidence.clamp(Decimal::ZERO, Decimal::ONE),
        }
    }
}

/// The market signal oracle's answer for a batch of assets. May be partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub signals: BTreeMap<String, AssetSignal>,
}

impl SignalSet {
    /// A signal set with no entries; every asset analysed against it is degraded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, asset: &str, movement_score: Decimal, confidence: Decimal) -> Self {
        self.signals
            .insert(asset.to_string(), AssetSignal::new(movement_score, confidence));
        self
    }

    pub fn get(&self, asset: &str) -> Option<&AssetSignal> {
        self.signals.get(asset)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Exchange rates normalised against a single reference currency.
///
/// Construction enforces the quote invariants: the reference currency maps to
/// exactly one and every rate is strictly positive. Deserialization goes through the
/// same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExchangeRates")]
pub struct ExchangeRates {
    reference: String,
    rates: BTreeMap<String, Decimal>,
}

#[derive(Deserialize)]
struct RawExchangeRates {
    reference: String,
    rates: BTreeMap<String, Decimal>,
}

impl TryFrom<RawExchangeRates> for ExchangeRates {
    type Error = CoreError;

    fn try_from(raw: RawExchangeRates) -> Result<Self, Self::Error> {
        ExchangeRates::new(raw.reference, raw.rates)
    }
}

impl ExchangeRates {
    pub fn new(
        reference: impl Into<String>,
        mut rates: BTreeMap<String, Decimal>,
    ) -> Result<Self, CoreError> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(invalid("reference", "blank reference currency"));
        }

        match rates.get(&reference) {
            Some(rate) if *rate != Decimal::ONE => {
                return Err(CoreError::InvalidRate(reference, *rate));
            }
            Some(_) => {}
            None => {
                rates.insert(reference.clone(), Decimal::ONE);
            }
        }

        if let Some((currency, rate)) = rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(CoreError::InvalidRate(currency.clone(), *rate));
        }

        Ok(Self { reference, rates })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn rates(&self) -> &BTreeMap<String, Decimal> {
        &self.rates
    }

    /// The requested currencies this rate set has no quote for.
    pub fn missing<'a>(&self, requested: &'a BTreeSet<String>) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|c| !self.rates.contains_key(c.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// The expected percentage profit of one asset after currency and financing adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitMargin {
    pub asset: String,
    pub margin: Decimal,
    /// Trade volume converted to the reference currency.
    pub volume_ref: Decimal,
    /// True when no predictive signal was available for this asset.
    pub signal_degraded: bool,
}

/// A classified, rankable view of one asset's margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub asset: String,
    pub action: RecommendationAction,
    pub margin: Decimal,
    pub movement_score: Decimal,
    pub confidence: Decimal,
    pub signal_degraded: bool,
}

/// The complete output of one differential analysis.
///
/// Every asset of the input appears either in `margins` or in `errors`, never both.
/// `degraded_assets` lists every asset analysed without a predictive signal,
/// whichever of the two it ended up in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub margins: BTreeMap<String, ProfitMargin>,
    /// Ordered by margin descending, ties by ascending asset identifier.
    pub recommendations: Vec<Recommendation>,
    pub errors: Vec<MarginComputationError>,
    pub degraded_assets: BTreeSet<String>,
}

impl AnalysisResult {
    pub fn margin(&self, asset: &str) -> Option<Decimal> {
        self.margins.get(asset).map(|m| m.margin)
    }

    pub fn error_for(&self, asset: &str) -> Option<&MarginComputationError> {
        self.errors.iter().find(|e| e.asset() == asset)
    }

    pub fn is_degraded(&self, asset: &str) -> bool {
        self.degraded_assets.contains(asset)
    }

    /// True if any asset failed or was computed without a signal.
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty() || !self.degraded_assets.is_empty()
    }

    /// Number of recommendations per band, in band order. Empty bands are included.
    pub fn band_counts(&self) -> BTreeMap<RecommendationAction, usize> {
        let mut counts: BTreeMap<RecommendationAction, usize> = RecommendationAction::ALL
            .iter()
            .map(|action| (*action, 0))
            .collect();
        for rec in &self.recommendations {
            *counts.entry(rec.action).or_insert(0) += 1;
        }
        counts
    }
}
