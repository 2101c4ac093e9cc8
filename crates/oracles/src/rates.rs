use crate::error::ApiError;
use crate::http::OracleHttp;
use crate::responses::RatesResponse;
use crate::RateOracle;
use async_trait::async_trait;
use configuration::EndpointConfig;
use core_types::ExchangeRates;
use std::collections::{BTreeMap, BTreeSet};

/// A `RateOracle` backed by an HTTP rate service.
///
/// Calls `GET {base_url}/rates?currencies=EUR,JPY` and expects
/// `{"reference": "USD", "rates": {"EUR": "1.08", "JPY": "0.0067"}}`.
#[derive(Clone)]
pub struct HttpRateOracle {
    http: OracleHttp,
}

impl HttpRateOracle {
    pub fn new(config: &EndpointConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: OracleHttp::new(config)?,
        })
    }
}

#[async_trait]
impl RateOracle for HttpRateOracle {
    async fn get_exchange_rates(
        &self,
        currencies: &BTreeSet<String>,
    ) -> Result<ExchangeRates, ApiError> {
        let joined = currencies
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut params = BTreeMap::from([("currencies", joined)]);
        let url = self.http.url("/rates", &mut params, None)?;

        tracing::debug!(count = currencies.len(), "Requesting exchange rates.");
        let response: RatesResponse = self.http.send(self.http.client().get(&url)).await?;
        response.into_exchange_rates(currencies)
    }
}
