use crate::batch::MarginBatch;
use core_types::{
    AssetSignal, ExchangeRates, MarginComputationError, MarketData, ProfitMargin, SignalSet,
};
use rust_decimal::Decimal;

/// The two numbers the margin formula yields for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginFigures {
    pub margin: Decimal,
    pub volume_ref: Decimal,
}

/// A stateless calculator for per-asset profit margins.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarginCalculator;

impl MarginCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Computes the net margin of a single position.
    ///
    /// 1. `volume_ref = volume * rate`
    /// 2. `gross = movement_score * confidence * volume_ref`
    /// 3. `financing = financing_rate * volume_ref`
    /// 4. `margin = (gross - financing) / volume_ref`, or zero with no exposure.
    ///
    /// Every step is checked; a decimal overflow is reported as
    /// `MarginComputationError::Overflow` rather than a panic.
    pub fn margin(
        &self,
        asset: &str,
        volume: Decimal,
        rate: Decimal,
        financing_rate: Decimal,
        signal: AssetSignal,
    ) -> Result<MarginFigures, MarginComputationError> {
        let overflow = || MarginComputationError::Overflow {
            asset: asset.to_string(),
        };

        let volume_ref = volume.checked_mul(rate).ok_or_else(overflow)?;
        if volume_ref <= Decimal::ZERO {
            // No trade exposure means no margin.
            return Ok(MarginFigures {
                margin: Decimal::ZERO,
                volume_ref: Decimal::ZERO,
            });
        }

        let gross_return = signal
            .movement_score
            .checked_mul(signal.confidence)
            .and_then(|weighted| weighted.checked_mul(volume_ref))
            .ok_or_else(overflow)?;
        let financing_cost = financing_rate.checked_mul(volume_ref).ok_or_else(overflow)?;
        let margin = gross_return
            .checked_sub(financing_cost)
            .and_then(|net| net.checked_div(volume_ref))
            .ok_or_else(overflow)?;

        Ok(MarginFigures { margin, volume_ref })
    }

    /// Computes margins for every asset of `data`, in asset identifier order.
    ///
    /// Assets absent from `signals` are computed with a zero score and zero
    /// confidence and recorded as degraded. Confidence outside [0, 1] is clamped.
    pub fn calculate(
        &self,
        data: &MarketData,
        signals: &SignalSet,
        rates: &ExchangeRates,
    ) -> MarginBatch {
        let mut batch = MarginBatch::new();

        for asset in &data.assets {
            let (signal, degraded) = match signals.get(asset) {
                Some(raw) => {
                    let clamped = raw.clamped();
                    if clamped != *raw {
                        tracing::warn!(
                            %asset,
                            confidence = %raw.confidence,
                            "Signal confidence outside [0, 1]; clamping."
                        );
                    }
                    (clamped, false)
                }
                None => {
                    batch.degraded.insert(asset.clone());
                    (AssetSignal::ABSENT, true)
                }
            };
            batch.applied_signals.insert(asset.clone(), signal);

            match self.calculate_asset(asset, data, signal, degraded, rates) {
                Ok(margin) => {
                    tracing::debug!(
                        %asset,
                        margin = %margin.margin,
                        volume_ref = %margin.volume_ref,
                        degraded = margin.signal_degraded,
                        "Margin computed."
                    );
                    batch.margins.insert(asset.clone(), margin);
                }
                Err(e) => {
                    tracing::warn!(%asset, error = %e, "Margin could not be computed.");
                    batch.errors.push(e);
                }
            }
        }

        batch
    }

    fn calculate_asset(
        &self,
        asset: &str,
        data: &MarketData,
        signal: AssetSignal,
        signal_degraded: bool,
        rates: &ExchangeRates,
    ) -> Result<ProfitMargin, MarginComputationError> {
        let missing = |field: &str| MarginComputationError::MissingInput {
            asset: asset.to_string(),
            field: field.to_string(),
        };

        let volume = data.trade_volume(asset).ok_or_else(|| missing("trade volume"))?;
        let financing_rate = data
            .financing_rate(asset)
            .ok_or_else(|| missing("financing rate"))?;
        let currency = data
            .base_currency(asset)
            .ok_or_else(|| missing("base currency"))?;
        let rate = rates
            .rate(currency)
            .ok_or_else(|| MarginComputationError::MissingRate {
                asset: asset.to_string(),
                currency: currency.to_string(),
            })?;

        let figures = self.margin(asset, volume, rate, financing_rate, signal)?;
        Ok(ProfitMargin {
            asset: asset.to_string(),
            margin: figures.margin,
            volume_ref: figures.volume_ref,
            signal_degraded,
        })
    }
}
