use crate::error::ApiError;
use crate::{MarketSignal, RateOracle};
use async_trait::async_trait;
use core_types::{ExchangeRates, MarketData, SignalSet};
use std::collections::BTreeSet;

/// A `RateOracle` that answers from a snapshot taken up front, e.g. a rates file.
#[derive(Debug, Clone)]
pub struct FixedRateOracle {
    rates: ExchangeRates,
}

impl FixedRateOracle {
    pub fn new(rates: ExchangeRates) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl RateOracle for FixedRateOracle {
    async fn get_exchange_rates(
        &self,
        currencies: &BTreeSet<String>,
    ) -> Result<ExchangeRates, ApiError> {
        let missing = self.rates.missing(currencies);
        if !missing.is_empty() {
            return Err(ApiError::RateUnavailable(format!(
                "snapshot has no quote for {}",
                missing.join(", ")
            )));
        }
        Ok(self.rates.clone())
    }
}

/// A `MarketSignal` that answers from a snapshot taken up front.
#[derive(Debug, Clone, Default)]
pub struct FixedSignal {
    signals: SignalSet,
}

impl FixedSignal {
    pub fn new(signals: SignalSet) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl MarketSignal for FixedSignal {
    async fn analyze_market(
        &self,
        assets: &BTreeSet<String>,
        _context: &MarketData,
    ) -> Result<SignalSet, ApiError> {
        let mut answer = SignalSet::empty();
        for asset in assets {
            if let Some(signal) = self.signals.get(asset) {
                answer.signals.insert(asset.clone(), *signal);
            }
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn fixed_rates_fail_whole_call_on_missing_currency() {
        let rates =
            ExchangeRates::new("USD", BTreeMap::from([("EUR".to_string(), dec!(1.1))])).unwrap();
        let oracle = FixedRateOracle::new(rates);

        assert!(oracle.get_exchange_rates(&set(&["EUR", "USD"])).await.is_ok());
        let err = oracle.get_exchange_rates(&set(&["EUR", "JPY"])).await.unwrap_err();
        assert!(matches!(err, ApiError::RateUnavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn fixed_signal_answers_only_requested_assets() {
        let oracle = FixedSignal::new(
            SignalSet::empty()
                .with_signal("A", dec!(0.3), dec!(0.9))
                .with_signal("B", dec!(-0.1), dec!(0.5)),
        );
        let answer = oracle
            .analyze_market(&set(&["B", "C"]), &MarketData::new())
            .await
            .unwrap();

        assert_eq!(answer.len(), 1);
        assert_eq!(answer.get("B").unwrap().movement_score, dec!(-0.1));
    }
}
