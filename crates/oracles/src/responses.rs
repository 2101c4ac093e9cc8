use crate::error::ApiError;
use core_types::{ExchangeRates, MarketData, SignalSet};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The response from a successful `GET /rates` request.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    pub reference: String,
    pub rates: BTreeMap<String, Decimal>,
}

impl RatesResponse {
    /// Converts the wire response into validated `ExchangeRates`.
    ///
    /// A rate set that does not cover every requested currency is rejected as a
    /// whole: a margin computed with a missing rate is meaningless.
    pub fn into_exchange_rates(
        self,
        requested: &BTreeSet<String>,
    ) -> Result<ExchangeRates, ApiError> {
        let rates = ExchangeRates::new(self.reference, self.rates)?;
        let missing = rates.missing(requested);
        if !missing.is_empty() {
            return Err(ApiError::RateUnavailable(format!(
                "no quote for {}",
                missing.join(", ")
            )));
        }
        Ok(rates)
    }
}

/// The body of a `POST /analyze` request.
#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub assets: &'a BTreeSet<String>,
    pub context: &'a MarketData,
}

/// A single asset's prediction from `POST /analyze`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SignalEntry {
    pub score: Decimal,
    pub confidence: Decimal,
}

/// The response from a successful `POST /analyze` request. May omit assets.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalResponse {
    pub signals: BTreeMap<String, SignalEntry>,
}

impl SignalResponse {
    /// Keeps only the requested assets. Missing ones are left for the engine's degraded policy.
    pub fn into_signal_set(self, requested: &BTreeSet<String>) -> SignalSet {
        self.signals
            .into_iter()
            .filter(|(asset, _)| {
                let wanted = requested.contains(asset);
                if !wanted {
                    tracing::debug!(%asset, "Ignoring signal for an asset that was not requested.");
                }
                wanted
            })
            .fold(SignalSet::empty(), |set, (asset, entry)| {
                set.with_signal(&asset, entry.score, entry.confidence)
            })
    }
}

/// Represents an error body returned by either oracle.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleErrorResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(alias = "msg", alias = "error")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn requested(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn complete_rate_response_converts() {
        let response: RatesResponse =
            serde_json::from_str(r#"{"reference":"USD","rates":{"EUR":"1.08","JPY":0.0067}}"#)
                .unwrap();
        let rates = response
            .into_exchange_rates(&requested(&["EUR", "JPY", "USD"]))
            .unwrap();

        assert_eq!(rates.reference(), "USD");
        assert_eq!(rates.rate("USD"), Some(Decimal::ONE));
        assert_eq!(rates.rate("EUR"), Some(dec!(1.08)));
        assert_eq!(rates.rate("JPY"), Some(dec!(0.0067)));
    }

    #[test]
    fn partial_rate_response_is_rejected_whole() {
        let response: RatesResponse =
            serde_json::from_str(r#"{"reference":"USD","rates":{"EUR":"1.08"}}"#).unwrap();
        let err = response
            .into_exchange_rates(&requested(&["EUR", "GBP", "JPY"]))
            .unwrap_err();

        match err {
            ApiError::RateUnavailable(message) => {
                assert!(message.contains("GBP") && message.contains("JPY"), "{message}");
            }
            other => panic!("expected RateUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_rate_is_invalid_data() {
        let response: RatesResponse =
            serde_json::from_str(r#"{"reference":"USD","rates":{"EUR":"0"}}"#).unwrap();
        let err = response.into_exchange_rates(&requested(&["EUR"])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidData(_)), "{err:?}");
    }

    #[test]
    fn signal_response_drops_unrequested_assets() {
        let response: SignalResponse = serde_json::from_str(
            r#"{"signals":{"A":{"score":0.4,"confidence":0.5},"Z":{"score":"1","confidence":"1"}}}"#,
        )
        .unwrap();
        let set = response.into_signal_set(&requested(&["A", "B"]));

        assert_eq!(set.len(), 1);
        let signal = set.get("A").unwrap();
        assert_eq!(signal.movement_score, dec!(0.4));
        assert_eq!(signal.confidence, dec!(0.5));
        assert!(set.get("B").is_none());
    }

    #[test]
    fn error_body_accepts_common_message_keys() {
        let a: OracleErrorResponse = serde_json::from_str(r#"{"code":-1,"msg":"boom"}"#).unwrap();
        let b: OracleErrorResponse = serde_json::from_str(r#"{"error":"down"}"#).unwrap();
        assert_eq!(a.code, Some(-1));
        assert_eq!(a.message, "boom");
        assert_eq!(b.message, "down");
    }

    #[test]
    fn analyze_request_serializes_assets_and_context() {
        let context = MarketData::new().with_asset("A", "USD", dec!(10), dec!(0.01));
        let body = serde_json::to_value(AnalyzeRequest {
            assets: &context.assets,
            context: &context,
        })
        .unwrap();

        assert_eq!(body["assets"], serde_json::json!(["A"]));
        assert_eq!(body["context"]["base_currencies"]["A"], "USD");
    }
}
